use crate::app::ports::{HttpResponse, SessionPort};
use crate::constants::{AUTH_COOKIE_NAME, CSRF_HEADER, USER_AGENT};
use crate::error::{Result, SniperError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, RETRY_AFTER};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Cookie-authenticated reqwest session. One instance, and so one connection
/// pool, is shared by every task of a run.
pub struct RobloxSession {
    client: reqwest::Client,
    cookie: String,
    csrf_token: Mutex<Option<String>>,
}

impl RobloxSession {
    pub fn new(cookie: &str) -> Result<Self> {
        let cookie = cookie.trim();
        if cookie.is_empty() {
            return Err(SniperError::NotAuthenticated(format!("{} cookie is empty", AUTH_COOKIE_NAME)));
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            cookie: cookie.to_string(),
            csrf_token: Mutex::new(None),
        })
    }

    fn cookie_header(&self) -> String {
        format!("{}={}", AUTH_COOKIE_NAME, self.cookie)
    }

    fn current_csrf_token(&self) -> Option<String> {
        self.csrf_token.lock().ok().and_then(|t| t.clone())
    }

    fn store_csrf_token(&self, token: String) {
        if let Ok(mut slot) = self.csrf_token.lock() {
            *slot = Some(token);
        }
    }

    async fn into_http_response(resp: reqwest::Response) -> Result<HttpResponse> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let bytes = resp.bytes().await?.to_vec();
        debug!(status, size = bytes.len(), "HTTP response");
        Ok(HttpResponse {
            status,
            content_type,
            retry_after,
            bytes,
        })
    }
}

#[async_trait]
impl SessionPort for RobloxSession {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("HTTP GET {}", url);
        let resp = self
            .client
            .get(url)
            .header(COOKIE, self.cookie_header())
            .send()
            .await?;
        Self::into_http_response(resp).await
    }

    /// POSTs need the CSRF token handed out by the first rejected request.
    /// A 403 that carries a fresh token is replayed once with it.
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        let mut replayed = false;
        loop {
            debug!("HTTP POST {}", url);
            let sent_token = self.current_csrf_token();
            let mut request = self
                .client
                .post(url)
                .header(COOKIE, self.cookie_header())
                .json(body);
            if let Some(token) = &sent_token {
                request = request.header(CSRF_HEADER, token.as_str());
            }
            let resp = request.send().await?;

            if resp.status().as_u16() == 403 && !replayed {
                let fresh = resp
                    .headers()
                    .get(CSRF_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if let Some(token) = fresh.filter(|t| Some(t) != sent_token.as_ref()) {
                    info!("Refreshed CSRF token");
                    self.store_csrf_token(token);
                    replayed = true;
                    continue;
                }
            }
            return Self::into_http_response(resp).await;
        }
    }
}
