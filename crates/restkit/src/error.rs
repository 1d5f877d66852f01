//! Error types for REST reconciliation.
//!
//! Errors are grouped into categories so callers can tell a broken resource
//! definition (fix the code or manifest) from a failed HTTP call (inspect the
//! remote system).

use crate::transport::TransportError;
use thiserror::Error;

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The resource type definition is inconsistent (raised when it is built)
    Definition,
    /// A property could not be converted to or from its JSON fragment
    Mapping,
    /// The HTTP transport reported a failure
    Transport,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether the error comes from the resource definition rather than from
    /// the remote system.
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Definition => "Invalid resource definition",
            Self::Mapping => "Property mapping failed",
            Self::Transport => "HTTP request failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Definition => "Check the URL templates, identity map and property list",
            Self::Mapping => "Check the mapping instructions and registered converters",
            Self::Transport => "Check the endpoint URL and that the API is reachable",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while defining or reconciling a REST resource.
#[derive(Debug, Error)]
pub enum Error {
    /// The document URL template is neither path- nor query-templated
    #[error("cannot determine selection mode for URL template '{template}'")]
    UnknownSelectionMode {
        /// The offending template
        template: String,
    },

    /// A query parameter in the template carries no value to infer a property from
    #[error(
        "URL template '{template}' needs an explicit identity map: query parameter '{parameter}' has no value"
    )]
    ExplicitIdentityRequired {
        /// The offending template
        template: String,
        /// Query parameter with an empty value list
        parameter: String,
    },

    /// The resource type definition is internally inconsistent
    #[error("invalid definition for resource type '{resource}': {message}")]
    InvalidDefinition {
        /// Resource type name
        resource: String,
        /// What is wrong with it
        message: String,
    },

    /// A value was declared for a property the schema does not know
    #[error("resource type '{resource}' has no property '{property}'")]
    UnknownProperty {
        /// Resource type name
        resource: String,
        /// The undeclared property
        property: String,
    },

    /// Malformed RFC 6570 template
    #[error("invalid URI template '{template}': {message}")]
    Template {
        /// The offending template
        template: String,
        /// Parse failure description
        message: String,
    },

    /// Malformed path expression
    #[error("invalid path expression '{path}': {message}")]
    InvalidPath {
        /// The offending expression
        path: String,
        /// Parse failure description
        message: String,
    },

    /// A mapping instruction of an unsupported shape
    #[error("unsupported mapping instruction for property '{property}': {found}")]
    InvalidMapping {
        /// Property the instruction was declared for
        property: String,
        /// Description of what was found instead
        found: String,
    },

    /// A hook mapping without a registered converter
    #[error("resource type '{resource}' is missing the {hook} converter")]
    MissingHook {
        /// Resource type name
        resource: String,
        /// Hook name, e.g. `ports_from_json`
        hook: String,
    },

    /// A merge operand was not a JSON object
    #[error("expected a JSON object, found {found}")]
    NotATree {
        /// JSON type that was found
        found: &'static str,
    },

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownSelectionMode { .. }
            | Error::ExplicitIdentityRequired { .. }
            | Error::InvalidDefinition { .. }
            | Error::UnknownProperty { .. }
            | Error::Template { .. } => ErrorCategory::Definition,
            Error::InvalidPath { .. }
            | Error::InvalidMapping { .. }
            | Error::MissingHook { .. }
            | Error::NotATree { .. } => ErrorCategory::Mapping,
            Error::Transport(_) => ErrorCategory::Transport,
            Error::Json(_) => ErrorCategory::Other,
        }
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport(err) => err.status,
            _ => None,
        }
    }

    pub(crate) fn invalid_path(path: &str, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn definition(resource: &str, message: impl Into<String>) -> Self {
        Error::InvalidDefinition {
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
