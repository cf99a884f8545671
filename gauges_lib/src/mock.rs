//! In-memory [`Transport`] for tests.
//!
//! Stubs are keyed by method and URL path. Every request is recorded so
//! callers can assert on exactly what was sent. Requests with no stub fail
//! with [`Error::Transport`], like a network that refuses connections.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::Error;
use crate::http::{HttpRequest, Method, Response, Transport};

/// A request as seen by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: Url,
    pub request: HttpRequest,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    stubs: HashMap<(Method, String), Response>,
    recorded: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON body and status.
    pub fn on(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        let mut response = Response::new(status, body);
        response
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.on_response(method, path, response)
    }

    pub fn on_response(mut self, method: Method, path: &str, response: Response) -> Self {
        self.stubs.insert((method, path.to_string()), response);
        self
    }

    /// Everything sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, url: Url, request: &HttpRequest) -> Result<Response, Error> {
        let key = (request.method, url.path().to_string());
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedRequest {
                url: url.clone(),
                request: request.clone(),
            });
        self.stubs.get(&key).cloned().ok_or_else(|| {
            Error::Transport(format!("no stub for {} {}", request.method, url))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            path: path.to_string(),
            query: vec![],
            headers: vec![],
            body: None,
        }
    }

    #[tokio::test]
    async fn returns_stub_and_records() {
        let mock = MockTransport::new().on(Method::Get, "/me", 200, json!({"user": {}}));
        let url = Url::parse("https://secure.gaug.es/me").unwrap();
        let res = mock.send(url.clone(), &get("/me")).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(mock.last_request().unwrap().url, url);
    }

    #[tokio::test]
    async fn unknown_route_is_a_transport_error() {
        let mock = MockTransport::new();
        let url = Url::parse("https://secure.gaug.es/nope").unwrap();
        let err = mock.send(url, &get("/nope")).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn method_is_part_of_the_key() {
        let mock = MockTransport::new().on(Method::Delete, "/gauges/1", 200, json!({}));
        let url = Url::parse("https://secure.gaug.es/gauges/1").unwrap();
        assert!(mock.send(url, &get("/gauges/1")).await.is_err());
    }
}
