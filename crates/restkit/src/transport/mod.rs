//! HTTP transport abstraction.
//!
//! The reconciliation engine only needs five verbs, each returning a
//! [`Response`] with a decoded JSON `data` payload. Retries, TLS and
//! authentication belong to implementations of [`Transport`], not to the
//! engine.

pub mod http;

use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use http::HttpTransport;

/// HTTP method, used for logging and by recording transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A decoded HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// JSON-decoded body (`null` for an empty body)
    pub data: Value,
}

impl Response {
    /// Create a response with status 200.
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }
}

/// Transport-level failure, carrying the HTTP status when one was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    /// HTTP status, if the server answered
    pub status: Option<u16>,
    /// Failure description
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "HTTP {code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result type for transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// The five verbs the reconciliation engine consumes.
///
/// URLs passed in are the expanded collection or document URLs of a
/// resource type; implementations decide how to resolve them (for example
/// against a base URL).
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> TransportResult<Response>;

    fn post(&self, url: &str, data: &Value) -> TransportResult<Response>;

    fn put(&self, url: &str, data: &Value) -> TransportResult<Response>;

    fn patch(&self, url: &str, data: &Value) -> TransportResult<Response>;

    fn delete(&self, url: &str) -> TransportResult<Response>;

    /// Dispatch by method; `data` is ignored for GET and DELETE.
    fn send(&self, method: Method, url: &str, data: &Value) -> TransportResult<Response> {
        match method {
            Method::Get => self.get(url),
            Method::Post => self.post(url, data),
            Method::Put => self.put(url, data),
            Method::Patch => self.patch(url, data),
            Method::Delete => self.delete(url),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport that replays canned responses and records calls.

    use super::{Method, Response, Transport, TransportError, TransportResult};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// A recorded request.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub method: Method,
        pub url: String,
        pub body: Option<Value>,
    }

    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<(Method, String), VecDeque<TransportResult<Response>>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful response for `method url`.
        pub fn respond(self, method: Method, url: &str, data: Value) -> Self {
            self.push(method, url, Ok(Response::ok(data)))
        }

        /// Queue a failure for `method url`.
        pub fn fail(self, method: Method, url: &str, status: u16) -> Self {
            self.push(
                method,
                url,
                Err(TransportError::new(Some(status), "mock failure")),
            )
        }

        fn push(self, method: Method, url: &str, result: TransportResult<Response>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry((method, url.to_string()))
                .or_default()
                .push_back(result);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Recorded calls other than GETs.
        pub fn writes(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| c.method != Method::Get)
                .collect()
        }

        fn handle(&self, method: Method, url: &str, body: Option<&Value>) -> TransportResult<Response> {
            self.calls.lock().unwrap().push(Call {
                method,
                url: url.to_string(),
                body: body.cloned(),
            });
            self.responses
                .lock()
                .unwrap()
                .get_mut(&(method, url.to_string()))
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| match method {
                    Method::Get => Err(TransportError::new(Some(404), "no canned response")),
                    _ => Ok(Response::ok(Value::Null)),
                })
        }
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str) -> TransportResult<Response> {
            self.handle(Method::Get, url, None)
        }

        fn post(&self, url: &str, data: &Value) -> TransportResult<Response> {
            self.handle(Method::Post, url, Some(data))
        }

        fn put(&self, url: &str, data: &Value) -> TransportResult<Response> {
            self.handle(Method::Put, url, Some(data))
        }

        fn patch(&self, url: &str, data: &Value) -> TransportResult<Response> {
            self.handle(Method::Patch, url, Some(data))
        }

        fn delete(&self, url: &str) -> TransportResult<Response> {
            self.handle(Method::Delete, url, None)
        }
    }
}
