use crate::app::ports::{HttpResponse, SessionPort};
use crate::error::{Result, SniperError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::debug;

/// One canned answer of the scripted session
#[derive(Clone, Debug)]
pub enum Scripted {
    Respond(HttpResponse),
    /// Fails the request as a transport error would
    TransportError(String),
    /// Waits until `gate` is notified, then responds
    Gated { gate: Arc<Notify>, response: HttpResponse },
    /// Notifies `gate`, then responds
    Release { gate: Arc<Notify>, response: HttpResponse },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

struct Route {
    needle: String,
    queue: VecDeque<Scripted>,
}

/// In-memory session for development and testing.
///
/// Requests are answered by the first registered route whose needle occurs in
/// the URL. A route's answers are consumed in order; the last one repeats.
/// Unmatched requests get a 404 with a non-JSON body.
#[derive(Default)]
pub struct ScriptedSession {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, needle: &str, answers: Vec<Scripted>) -> &Self {
        self.routes.lock().unwrap().push(Route {
            needle: needle.to_string(),
            queue: answers.into(),
        });
        self
    }

    pub fn respond(&self, needle: &str, response: HttpResponse) -> &Self {
        self.route(needle, vec![Scripted::Respond(response)])
    }

    pub fn respond_json(&self, needle: &str, status: u16, body: Value) -> &Self {
        self.respond(needle, HttpResponse::json_body(status, &body))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.contains(needle))
            .count()
    }

    fn next_answer(&self, url: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| !r.queue.is_empty() && url.contains(&r.needle))?;
        if route.queue.len() > 1 {
            route.queue.pop_front()
        } else {
            route.queue.front().cloned()
        }
    }

    async fn answer(&self, method: &'static str, url: &str, body: Option<Value>) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
        debug!("scripted {} {}", method, url);

        match self.next_answer(url) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::TransportError(message)) => Err(SniperError::Api { message }),
            Some(Scripted::Gated { gate, response }) => {
                gate.notified().await;
                Ok(response)
            }
            Some(Scripted::Release { gate, response }) => {
                gate.notify_one();
                Ok(response)
            }
            None => Ok(HttpResponse {
                status: 404,
                content_type: "text/plain".to_string(),
                retry_after: None,
                bytes: b"not found".to_vec(),
            }),
        }
    }
}

#[async_trait]
impl SessionPort for ScriptedSession {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.answer("GET", url, None).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        self.answer("POST", url, Some(body.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_answers_are_consumed_then_last_repeats() {
        let session = ScriptedSession::new();
        session.route(
            "/a",
            vec![
                Scripted::Respond(HttpResponse::json_body(429, &json!({}))),
                Scripted::Respond(HttpResponse::json_body(200, &json!({}))),
            ],
        );

        assert_eq!(session.get("http://x/a").await.unwrap().status, 429);
        assert_eq!(session.get("http://x/a").await.unwrap().status, 200);
        assert_eq!(session.get("http://x/a").await.unwrap().status, 200);
        assert_eq!(session.get("http://x/b").await.unwrap().status, 404);
        assert_eq!(session.count("GET", "/a"), 3);
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        let session = ScriptedSession::new();
        session.respond_json("cursor=2", 200, json!("second"));
        session.respond_json("/items", 200, json!("first"));

        let first = session.get("http://x/items?q=1").await.unwrap();
        let second = session.get("http://x/items?q=1&cursor=2").await.unwrap();
        assert_eq!(first.json::<String>().unwrap(), "first");
        assert_eq!(second.json::<String>().unwrap(), "second");
    }
}
