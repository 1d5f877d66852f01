//! Blocking HTTP transport backed by `ureq`.

use super::{Response, Transport, TransportError, TransportResult};
use serde_json::Value;
use std::time::Duration;

/// Blocking JSON-over-HTTP transport bound to a base URL.
///
/// Relative URLs (as produced by resource type templates) are joined onto
/// the base URL; absolute `http://` / `https://` URLs are used as-is.
///
/// # Example
///
/// ```no_run
/// use restkit::transport::{HttpTransport, Transport};
///
/// let transport = HttpTransport::new("https://cluster.example.com");
/// let response = transport.get("/api/cluster").unwrap();
/// println!("{}", response.data);
/// ```
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Base URL that relative paths are joined onto.
    base_url: String,
}

impl HttpTransport {
    /// Create a transport with ureq's default agent configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
        }
    }

    /// Create a transport whose requests fail after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a request URL against the base URL.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> TransportResult<Response> {
        let url = self.url(url);
        log::debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .call()?;
        decode(response)
    }

    fn post(&self, url: &str, data: &Value) -> TransportResult<Response> {
        let url = self.url(url);
        log::debug!("POST {url} {data}");
        let response = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .send_json(data)?;
        decode(response)
    }

    fn put(&self, url: &str, data: &Value) -> TransportResult<Response> {
        let url = self.url(url);
        log::debug!("PUT {url} {data}");
        let response = self
            .agent
            .put(&url)
            .header("Accept", "application/json")
            .send_json(data)?;
        decode(response)
    }

    fn patch(&self, url: &str, data: &Value) -> TransportResult<Response> {
        let url = self.url(url);
        log::debug!("PATCH {url} {data}");
        let response = self
            .agent
            .patch(&url)
            .header("Accept", "application/json")
            .send_json(data)?;
        decode(response)
    }

    fn delete(&self, url: &str) -> TransportResult<Response> {
        let url = self.url(url);
        log::debug!("DELETE {url}");
        let response = self
            .agent
            .delete(&url)
            .header("Accept", "application/json")
            .call()?;
        decode(response)
    }
}

/// Read a response body as JSON; an empty body decodes as `null`.
fn decode(mut response: ureq::http::Response<ureq::Body>) -> TransportResult<Response> {
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string()?;
    let data = parse_body(&text)
        .map_err(|e| TransportError::new(Some(status), format!("invalid JSON body: {e}")))?;
    Ok(Response { status, data })
}

fn parse_body(text: &str) -> Result<Value, serde_json::Error> {
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(text)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::new(Some(code), format!("HTTP {code}")),
            other => Self::new(None, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://host/", "/api/v1/x"),
            "https://host/api/v1/x"
        );
        assert_eq!(join_url("https://host", "api/v1/x"), "https://host/api/v1/x");
        assert_eq!(
            join_url("https://host", "http://other/api"),
            "http://other/api"
        );
    }

    #[test]
    fn test_parse_body_empty_is_null() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
        assert_eq!(parse_body(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(parse_body("{not json").is_err());
    }

    #[test]
    fn test_status_error_conversion() {
        let err: TransportError = ureq::Error::StatusCode(503).into();
        assert_eq!(err.status, Some(503));
    }

    #[test]
    fn test_base_url_accessor() {
        let transport = HttpTransport::new("https://cluster.example.com");
        assert_eq!(transport.base_url(), "https://cluster.example.com");
        assert_eq!(
            transport.url("/api/cluster"),
            "https://cluster.example.com/api/cluster"
        );
    }
}
