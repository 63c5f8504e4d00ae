use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// URL-encoded form body, sent for POST requests.
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            form,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The outbound HTTP seam for network adapters. Production uses reqwest;
/// tests substitute a recording mock so adapter behavior can be verified
/// without network access.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// A transport with its own isolated cookie store, used for exactly one
    /// scraping session and dropped when that session ends. Sessions never
    /// leak cookies across sync calls.
    fn isolated_session(&self) -> Result<Arc<dyn HttpTransport>, TransportError>;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("afftrack/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    fn with_cookie_store() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url).form(&request.form),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    fn isolated_session(&self) -> Result<Arc<dyn HttpTransport>, TransportError> {
        Ok(Arc::new(Self::with_cookie_store()?))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every request and replays canned responses in FIFO order.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<MockState>>,
    }

    #[derive(Default)]
    struct MockState {
        responses: VecDeque<Result<HttpResponse, String>>,
        requests: Vec<HttpRequest>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, status: u16, body: &str) {
            self.inner
                .lock()
                .unwrap()
                .responses
                .push_back(Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }));
        }

        pub fn push_error(&self, message: &str) {
            self.inner
                .lock()
                .unwrap()
                .responses
                .push_back(Err(message.to_string()));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.inner.lock().unwrap().requests.clone()
        }

        pub fn request_count(&self) -> usize {
            self.inner.lock().unwrap().requests.len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut state = self.inner.lock().unwrap();
            state.requests.push(request);
            match state.responses.pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(TransportError::Other(message)),
                None => Err(TransportError::Other(
                    "no canned response queued".to_string(),
                )),
            }
        }

        fn isolated_session(&self) -> Result<Arc<dyn HttpTransport>, TransportError> {
            Ok(Arc::new(self.clone()))
        }
    }
}
