use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// HTTP request passed to the requester
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    /// JSON body for POST requests; GET payloads are encoded into the URL
    pub body: Option<String>,
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// HTTP response returned by the requester.
/// The body is returned for non-2xx statuses too; classification happens
/// in the request pipeline, never in the transport.
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

/// Boundary to the HTTP transport: anything that can issue GET/POST with
/// headers, a body and a timeout, and return status+body on both success
/// and non-2xx responses.
pub trait HttpRequester: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default blocking reqwest-based requester
pub struct ReqwestRequester {
    client: reqwest::blocking::Client,
}

impl ReqwestRequester {
    /// Create a requester with the given request timeout
    pub fn new(timeout: Duration) -> Self {
        ReqwestRequester {
            client: crate::client::create_http_client(timeout),
        }
    }
}

impl HttpRequester for ReqwestRequester {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(HttpResponse { status, body })
    }
}

/// Scripted requester used by tests: returns queued responses in order and
/// records every request it is asked to send.
#[derive(Default)]
pub struct MockRequester {
    responses: Mutex<Vec<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; responses are returned in queue order
    pub fn queue(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses.lock().unwrap().push(HttpResponse {
            status,
            body: body.into(),
        });
        self
    }

    /// Queue a JSON response
    pub fn queue_json(&self, status: u16, body: &serde_json::Value) -> &Self {
        self.queue(status, body.to_string())
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of dispatches performed
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpRequester for MockRequester {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::transport(
                0,
                serde_json::Value::Null,
                "no mock response queued",
            ));
        }
        Ok(responses.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_requester_queue_order() {
        let mock = MockRequester::new();
        mock.queue(200, "first").queue(500, "second");

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "https://example.com".to_string(),
            headers: HashMap::new(),
            body: None,
        };

        let first = mock.send(request.clone()).unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.body, "first");

        let second = mock.send(request).unwrap();
        assert_eq!(second.status, 500);
        assert!(!second.is_success());

        assert_eq!(mock.request_count(), 2);
    }

    #[test]
    fn test_mock_requester_exhausted_queue() {
        let mock = MockRequester::new();
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://example.com".to_string(),
            headers: HashMap::new(),
            body: Some("{}".to_string()),
        };

        assert!(mock.send(request).is_err());
    }

    #[test]
    fn test_http_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
    }
}
