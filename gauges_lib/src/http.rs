//! Request descriptors, responses, and the transport seam.
//!
//! The client describes each call as an [`HttpRequest`] and hands it to a
//! [`Transport`], which performs the round-trip and returns a [`Response`].
//! [`ReqwestTransport`] is the production transport; tests substitute
//! [`MockTransport`](crate::mock::MockTransport).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::Error;
use crate::models::{Failure, ValidationErrors};

/// Default per-request timeout of [`ReqwestTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a body.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call described as plain data.
///
/// `path` is relative to the client's base URL and already percent-encoded.
/// `query` is only populated for GET, `body` only for POST and PUT.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Absolute URL for this request against `base`.
    ///
    /// A path prefix on `base` (e.g. `http://127.0.0.1:9000/api`) is kept.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, self.path));
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}

/// Status, headers and decoded body of one round-trip. Never altered by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// `{"status": "fail", "message": ...}` bodies (401, 404).
    pub fn failure(&self) -> Option<Failure> {
        if self.body.get("status").and_then(Value::as_str) != Some("fail") {
            return None;
        }
        Failure::deserialize(&self.body).ok()
    }

    /// `{"errors": {...}, "full_messages": [...]}` bodies (422).
    pub fn validation_errors(&self) -> Option<ValidationErrors> {
        self.body.get("errors")?;
        ValidationErrors::deserialize(&self.body).ok()
    }

    /// A navigation link from the body's `urls` object, for
    /// [`Client::resolve_by_url`](crate::Client::resolve_by_url).
    pub fn url(&self, key: &str) -> Option<&str> {
        self.body.get("urls")?.get(key)?.as_str()
    }

    /// Typed view of the resource under `key`, or of the whole body when the
    /// envelope has no such key.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T, Error> {
        let value = self.body.get(key).unwrap_or(&self.body);
        T::deserialize(value).map_err(|e| Error::Decode(e.to_string()))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Decode a response body. Empty bodies become `null`; bodies that are not
/// JSON are kept as a JSON string of the raw text.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Executes request descriptors.
///
/// Implementations own connection reuse, TLS and timeouts. They must not
/// treat non-2xx statuses as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: Url, request: &HttpRequest) -> Result<Response, Error>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: Url, request: &HttpRequest) -> Result<Response, Error> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut req = self.http.request(method, url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|e| Error::Transport(e.to_string()))?;
        let status = res.status().as_u16();
        let headers = res
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = res.text().await.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Response {
            status,
            headers,
            body: decode_body(&text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(path: &str, query: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: vec![("X-Gauges-Token".to_string(), "asdf".to_string())],
            body: None,
        }
    }

    #[test]
    fn url_joins_base_and_path() {
        let base = Url::parse("https://secure.gaug.es").unwrap();
        let url = request("/gauges/abc/content", &[]).url(&base);
        assert_eq!(url.as_str(), "https://secure.gaug.es/gauges/abc/content");
    }

    #[test]
    fn url_keeps_base_prefix_and_encodes_query() {
        let base = Url::parse("http://127.0.0.1:9000/api/").unwrap();
        let url = request("/gauges/abc/content", &[("page", "2"), ("date", "2011-08-01")]).url(&base);
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/api/gauges/abc/content?page=2&date=2011-08-01"
        );
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request("/me", &[]);
        assert_eq!(req.header("x-gauges-token"), Some("asdf"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn method_body_rules() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn decode_body_variants() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(
            decode_body("<html>Bad Gateway</html>"),
            Value::String("<html>Bad Gateway</html>".to_string())
        );
    }

    #[test]
    fn response_failure_shape() {
        let res = Response::new(
            401,
            json!({"status": "fail", "message": "Authentication required"}),
        );
        assert!(!res.is_success());
        let failure = res.failure().unwrap();
        assert_eq!(failure.status, "fail");
        assert_eq!(failure.message, "Authentication required");
        assert!(res.validation_errors().is_none());
    }

    #[test]
    fn response_validation_shape() {
        let res = Response::new(
            422,
            json!({
                "errors": {"tz": "is not included in the list"},
                "full_messages": ["Tz is not included in the list"]
            }),
        );
        let errors = res.validation_errors().unwrap();
        assert_eq!(errors.errors["tz"], "is not included in the list");
        assert_eq!(errors.full_messages, vec!["Tz is not included in the list"]);
        assert!(res.failure().is_none());
    }

    #[test]
    fn response_url_reads_urls_object() {
        let res = Response::new(
            200,
            json!({"urls": {"older": "https://secure.gaug.es/gauges/x/content?page=2", "newer": null}}),
        );
        assert_eq!(
            res.url("older"),
            Some("https://secure.gaug.es/gauges/x/content?page=2")
        );
        assert_eq!(res.url("newer"), None);
        assert_eq!(res.url("self"), None);
    }

    #[test]
    fn response_header_lookup() {
        let mut res = Response::new(200, Value::Null);
        res.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        assert_eq!(res.header("content-type"), Some("application/json"));
    }

    mod wire {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        /// What the server saw: request line, headers, raw body.
        struct Received {
            request_line: String,
            headers: Vec<(String, String)>,
            body: String,
        }

        impl Received {
            fn header(&self, name: &str) -> Option<&str> {
                find_header(&self.headers, name)
            }
        }

        /// Accept one connection, record the request, answer with `raw`.
        async fn serve_once(raw: &'static str) -> (Url, JoinHandle<Received>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let received = read_request(&mut socket).await;
                socket.write_all(raw.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
                received
            });
            (Url::parse(&format!("http://{}/", addr)).unwrap(), handle)
        }

        async fn read_request(socket: &mut TcpStream) -> Received {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break i;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
            let mut lines = head.split("\r\n");
            let request_line = lines.next().unwrap_or_default().to_string();
            let headers: Vec<(String, String)> = lines
                .filter_map(|l| l.split_once(':'))
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect();
            let len = find_header(&headers, "content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + 4 + len {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&buf[head_end + 4..head_end + 4 + len]).into_owned();
            Received {
                request_line,
                headers,
                body,
            }
        }

        /// Loopback traffic must not go through a proxy from the environment.
        fn transport() -> ReqwestTransport {
            ReqwestTransport::from_client(reqwest::Client::builder().no_proxy().build().unwrap())
        }

        fn token_request(method: Method, path: &str, body: Option<Value>) -> HttpRequest {
            let mut headers = vec![
                ("X-Gauges-Token".to_string(), "asdf".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ];
            if body.is_some() {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
            }
            HttpRequest {
                method,
                path: path.to_string(),
                query: vec![],
                headers,
                body,
            }
        }

        #[tokio::test]
        async fn error_status_is_a_response_with_headers() {
            let (base, server) = serve_once(
                "HTTP/1.1 401 Unauthorized\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: 53\r\n\
                 Connection: close\r\n\r\n\
                 {\"status\":\"fail\",\"message\":\"Authentication required\"}",
            )
            .await;
            let req = token_request(Method::Get, "/clients", None);
            let res = transport()
                .send(req.url(&base), &req)
                .await
                .unwrap();

            assert_eq!(res.status, 401);
            assert_eq!(res.header("content-type"), Some("application/json"));
            assert_eq!(res.failure().unwrap().message, "Authentication required");

            let received = server.await.unwrap();
            assert_eq!(received.request_line, "GET /clients HTTP/1.1");
            assert_eq!(received.header("x-gauges-token"), Some("asdf"));
            assert_eq!(received.header("authorization"), None);
        }

        #[tokio::test]
        async fn json_body_and_basic_auth_reach_the_wire() {
            let (base, server) = serve_once(
                "HTTP/1.1 422 Unprocessable Entity\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: 81\r\n\
                 Connection: close\r\n\r\n\
                 {\"errors\":{\"tz\":\"is not included in the list\"},\"full_messages\":[\"Tz is invalid\"]}",
            )
            .await;
            let mut req = token_request(
                Method::Post,
                "/gauges",
                Some(json!({"title": "T", "tz": "Z"})),
            );
            req.headers[0] = (
                "Authorization".to_string(),
                "Basic am9obkBvcmRlcmVkbGlzdC5jb206Zm9vYmFy".to_string(),
            );
            let res = transport()
                .send(req.url(&base), &req)
                .await
                .unwrap();

            assert_eq!(res.status, 422);
            assert_eq!(
                res.body,
                json!({
                    "errors": {"tz": "is not included in the list"},
                    "full_messages": ["Tz is invalid"]
                })
            );

            let received = server.await.unwrap();
            assert_eq!(received.request_line, "POST /gauges HTTP/1.1");
            assert_eq!(
                received.header("authorization"),
                Some("Basic am9obkBvcmRlcmVkbGlzdC5jb206Zm9vYmFy")
            );
            assert_eq!(received.header("x-gauges-token"), None);
            assert_eq!(received.header("content-type"), Some("application/json"));
            let sent: Value = serde_json::from_str(&received.body).unwrap();
            assert_eq!(sent, json!({"title": "T", "tz": "Z"}));
        }

        #[tokio::test]
        async fn empty_body_decodes_to_null() {
            let (base, server) = serve_once(
                "HTTP/1.1 200 OK\r\n\
                 Content-Length: 0\r\n\
                 Connection: close\r\n\r\n",
            )
            .await;
            let req = token_request(Method::Delete, "/gauges/g1", None);
            let res = transport()
                .send(req.url(&base), &req)
                .await
                .unwrap();

            assert_eq!(res.status, 200);
            assert_eq!(res.body, Value::Null);
            let received = server.await.unwrap();
            assert_eq!(received.request_line, "DELETE /gauges/g1 HTTP/1.1");
            assert!(received.body.is_empty());
        }

        #[tokio::test]
        async fn non_json_body_is_kept_as_text() {
            let (base, server) = serve_once(
                "HTTP/1.1 502 Bad Gateway\r\n\
                 Content-Type: text/html\r\n\
                 Content-Length: 24\r\n\
                 Connection: close\r\n\r\n\
                 <html>Bad Gateway</html>",
            )
            .await;
            let req = token_request(Method::Get, "/me", None);
            let res = transport()
                .send(req.url(&base), &req)
                .await
                .unwrap();

            assert_eq!(res.status, 502);
            assert_eq!(res.body, Value::String("<html>Bad Gateway</html>".to_string()));
            server.await.unwrap();
        }

        #[tokio::test]
        async fn refused_connection_is_a_transport_error() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            let base = Url::parse(&format!("http://{}/", addr)).unwrap();
            let req = token_request(Method::Get, "/me", None);
            let err = transport()
                .send(req.url(&base), &req)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Transport(_)));
        }
    }
}
