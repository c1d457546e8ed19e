use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Authenticated request executor shared by every pipeline task.
/// Implementations own the session (cookie, CSRF token, connection pool).
#[async_trait]
pub trait SessionPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse>;
}

#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub retry_after: Option<Duration>,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn json_body(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8".to_string(),
            retry_after: None,
            bytes: body.to_string().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Throttling or a transient server fault; worth resubmitting as is.
    /// Other 4xx answers are rejections of the request itself.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limited() || self.status == 408 || (500..600).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        let ct = self.content_type.to_ascii_lowercase();
        ct.starts_with("application/json") || ct.contains("+json")
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }

    /// Short lossy preview of the body for log lines
    pub fn body_preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.bytes);
        text.chars().take(200).collect()
    }
}
