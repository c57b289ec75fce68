//! Mock HTTP transport for testing.

use crate::error::TransferError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Create a response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create a successful response with empty body.
    pub fn ok() -> Self {
        Self::status(200)
    }

    /// Create an error response.
    pub fn error(status: u16, body: impl Into<Bytes>) -> Self {
        Self::status(status).with_body(body)
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header to the response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

enum Queued {
    Response(MockResponse),
    Error(TransferError),
}

/// Mock HTTP transport returning queued responses and recording requests.
pub struct MockTransport {
    queue: Mutex<VecDeque<Queued>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Option<MockResponse>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Create a new mock transport with no responses.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: None,
            delay: None,
        }
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        let transport = Self::new();
        for response in responses {
            transport.queue_response(response);
        }
        transport
    }

    /// Create a mock transport with a default response.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::new()
        }
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: MockResponse) {
        self.queue.lock().push_back(Queued::Response(response));
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: TransferError) {
        self.queue.lock().push_back(Queued::Error(error));
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransferError> {
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.queue.lock().pop_front();
        match next {
            Some(Queued::Response(mock)) => Ok(HttpResponse {
                status: mock.status,
                headers: mock.headers,
                body: mock.body,
            }),
            Some(Queued::Error(error)) => Err(error),
            None => match &self.default_response {
                Some(mock) => Ok(HttpResponse {
                    status: mock.status,
                    headers: mock.headers.clone(),
                    body: mock.body.clone(),
                }),
                None => Err(TransferError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                }),
            },
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_responses", &self.queue.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}
