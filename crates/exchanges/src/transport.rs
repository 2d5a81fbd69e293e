//! HTTP transport seam for the exchange adapters.
//!
//! Adapters build fully signed [`HttpRequest`]s and hand them to a
//! [`Transport`]. Production uses [`HttpTransport`] (a pooled
//! `reqwest::Client` with a fixed per-request timeout); tests script
//! responses by implementing the trait. Network failures surface as
//! [`AdapterError::Transport`]; there is no retry and no circuit
//! breaker.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use od_core::error::AdapterError;

/// HTTP methods the exchange surfaces use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET, used by all fetches and probes.
    Get,
    /// POST, used by the OKX cancel.
    Post,
    /// DELETE, used by Binance and Gate cancels.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully prepared request: signed query/body and auth headers included.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including any query string.
    pub url: String,
    /// Headers to send, auth headers included.
    pub headers: Vec<(String, String)>,
    /// Request body bytes, exactly as signed.
    pub body: Option<String>,
}

/// Status and body of one exchange response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One blocking network round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the full response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError>;
}

/// Production transport over a pooled `reqwest::Client`.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Delete => self.client.delete(&request.url),
        }
        .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        // The URL query carries signatures; log method and status only.
        debug!(method = %request.method, status, "exchange response");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Transport returning pre-scripted responses in order, recording
    /// every request it receives.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, AdapterError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<HttpResponse, AdapterError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Shorthand for a scripted success response.
        pub(crate) fn reply(status: u16, body: &str) -> Result<HttpResponse, AdapterError> {
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            })
        }

        /// All requests received so far, in order.
        pub(crate) fn recorded(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(AdapterError::Transport("no scripted response left".to_string()))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_is_success_bounds() {
        assert!(HttpResponse { status: 200, body: String::new() }.is_success());
        assert!(HttpResponse { status: 299, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 300, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 404, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 199, body: String::new() }.is_success());
    }

    #[test]
    fn test_transport_is_object_safe() {
        fn _assert_object_safe(_t: &dyn Transport) {}
    }
}
