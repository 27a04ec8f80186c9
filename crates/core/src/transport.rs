//! Network boundary.
//!
//! The controller only ever issues two kinds of request: a GET for reference data and a JSON
//! POST to the webhook. [`HttpTransport`] is the seam between the controller and whatever
//! performs those requests; [`ReqwestTransport`] is the production implementation.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached at all (connection refused, DNS failure, timeout).
    #[error("failed to fetch: {0}")]
    Unreachable(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// POST `body` with `Content-Type: application/json`.
    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        Self::into_response(response).await
    }

    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify)?;
        Self::into_response(response).await
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Get { url: String },
        Post { url: String, body: String },
    }

    /// Scripted transport that records every request.
    ///
    /// When a script runs dry GETs answer `200 []` and POSTs answer `200` with an empty body.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        gets: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        posts: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        calls: Mutex<Vec<Call>>,
        post_delay: Option<Duration>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_users(self, json: &str) -> Self {
            self.with_get(Ok(HttpResponse::new(200, json)))
        }

        pub(crate) fn with_get(self, result: Result<HttpResponse, TransportError>) -> Self {
            self.gets.lock().unwrap().push_back(result);
            self
        }

        pub(crate) fn with_post(self, result: Result<HttpResponse, TransportError>) -> Self {
            self.posts.lock().unwrap().push_back(result);
            self
        }

        pub(crate) fn with_post_delay(mut self, delay: Duration) -> Self {
            self.post_delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn posts(&self) -> Vec<(String, serde_json::Value)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Post { url, body } => {
                        Some((url, serde_json::from_str(&body).unwrap()))
                    }
                    Call::Get { .. } => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Call::Get {
                url: url.to_string(),
            });
            let next = self.gets.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(HttpResponse::new(200, "[]")))
        }

        async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Call::Post {
                url: url.to_string(),
                body,
            });
            if let Some(delay) = self.post_delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.posts.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_half_open() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    /// Accept one connection, capture the request, answer with `response`.
    async fn one_shot_server(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let body_len = text
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|len| len.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(request).unwrap()
        });
        (format!("http://{addr}/webhook"), server)
    }

    #[tokio::test]
    async fn post_sends_json_and_passes_error_status_through() {
        let (url, server) = one_shot_server(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\nconnection: close\r\n\r\nboom",
        )
        .await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let response = transport
            .post_json(&url, r#"{"field1":"alice"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(response, HttpResponse::new(500, "boom"));
        assert!(!response.is_success());

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(request.starts_with("POST /webhook HTTP/1.1"), "{request}");
        assert!(lowered.contains("content-type: application/json"), "{request}");
        assert!(request.ends_with(r#"{"field1":"alice"}"#), "{request}");
    }

    #[tokio::test]
    async fn get_returns_status_and_body() {
        let (url, server) = one_shot_server(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n[]",
        )
        .await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let response = transport.get(&url).await.unwrap();
        assert_eq!(response, HttpResponse::new(200, "[]"));
        assert!(server.await.unwrap().starts_with("GET /webhook HTTP/1.1"));
    }

    #[tokio::test]
    async fn unreachable_host_is_classified_as_unreachable() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        // Port 9 on loopback is the discard service; nothing listens there in test sandboxes.
        let err = transport.get("http://127.0.0.1:9/users").await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)), "{err:?}");
    }
}
