//! Overridable response handling.
//!
//! Every successful transport call passes through
//! [`ResponseHooks::postprocess`] before the engine looks at `data`; every
//! failed write passes through [`ResponseHooks::handle_error`].

use crate::error::Result;
use crate::transport::{Response, TransportError};
use serde_json::Value;

/// Hooks a resource type can override to normalize responses.
pub trait ResponseHooks: Send + Sync {
    /// Normalize a successful response. Defaults to identity.
    fn postprocess(&self, response: Response) -> Response {
        response
    }

    /// Handle a failed write call. Defaults to re-raising the error.
    ///
    /// Returning `Ok` turns the failure into a (synthetic) success.
    fn handle_error(&self, error: TransportError) -> Result<Response> {
        Err(error.into())
    }
}

/// Identity post-processing, re-raising error handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ResponseHooks for DefaultHooks {}

/// Unwraps enveloped responses such as `{"num_records": 1, "records": [...]}`.
///
/// When `data` is an object holding `records_key`, `data` is replaced by that
/// member; anything else passes through untouched.
#[derive(Debug, Clone)]
pub struct EnvelopeHooks {
    records_key: String,
}

impl EnvelopeHooks {
    pub fn new(records_key: impl Into<String>) -> Self {
        Self {
            records_key: records_key.into(),
        }
    }

    pub fn records_key(&self) -> &str {
        &self.records_key
    }
}

impl ResponseHooks for EnvelopeHooks {
    fn postprocess(&self, mut response: Response) -> Response {
        if let Value::Object(map) = &mut response.data
            && let Some(records) = map.remove(&self.records_key)
        {
            response.data = records;
        }
        response
    }
}
