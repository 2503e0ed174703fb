use serde_json::{json, Value};
use thiserror::Error;

/// Sub-classification of business API errors by result-code range.
///
/// Informational only: callers should branch on the carried code, the kind
/// exists to make log messages and `details()` output clearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Result code in the 400 range (caller-side problem)
    Client,
    /// Result code in the 500 range (remote-side problem)
    Server,
    /// Any other non-success result code
    Business,
}

impl ApiErrorKind {
    /// Classify a business result code by numeric range
    pub fn from_code(code: &str) -> Self {
        match code.parse::<u32>() {
            Ok(n) if (400..500).contains(&n) => ApiErrorKind::Client,
            Ok(n) if (500..600).contains(&n) => ApiErrorKind::Server,
            _ => ApiErrorKind::Business,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Client => "client",
            ApiErrorKind::Server => "server",
            ApiErrorKind::Business => "business",
        }
    }
}

/// Main error type for API client operations
#[derive(Debug, Error)]
pub enum Error {
    /// Payload failed schema validation; raised before any network call.
    /// Carries one "field: reason" message per violated constraint.
    #[error("validation failed: {}", messages.join("; "))]
    Validation { messages: Vec<String> },

    /// Token acquisition failed, or the one permitted retry after a
    /// token-expiry signal failed again
    #[error("authentication failed (status {status}): {message}")]
    Authentication {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Non-success business result code or unclassified non-2xx transport
    /// status; carries the full raw body for diagnostics
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        kind: ApiErrorKind,
        body: Value,
    },

    /// Endpoint key not present in the descriptor table
    #[error("unknown endpoint key: {0}")]
    UnknownEndpoint(String),

    /// Caller passed a raw path instead of a descriptor key
    #[error("endpoint keys must not be paths: {0}")]
    InvalidEndpointKey(String),

    /// Schema lookup by a name that was never registered
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error (includes timeouts)
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an authentication error from an upstream response
    pub fn auth(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Error::Authentication {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create a transport-level API error (non-2xx status, no business code)
    pub fn transport(status: u16, body: Value, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            code: None,
            message: message.into(),
            kind: ApiErrorKind::Server,
            body,
        }
    }

    /// Create a business API error from an unwrapped result code
    pub fn business(status: u16, code: &str, message: impl Into<String>, body: Value) -> Self {
        Error::Api {
            status,
            code: Some(code.to_string()),
            message: message.into(),
            kind: ApiErrorKind::from_code(code),
            body,
        }
    }

    /// Check whether this error describes a token-expiry situation,
    /// so callers can decide to force a fresh login flow
    pub fn is_token_expired(&self) -> bool {
        match self {
            Error::Authentication { status, code, .. } => {
                *status == 401 || code.as_deref() == Some("900901")
            }
            _ => false,
        }
    }

    /// Get the HTTP status code if this error carries one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } => Some(*status),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the field-level violation messages for a validation error
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Error::Validation { messages } => Some(messages),
            _ => None,
        }
    }

    /// Render the error as a plain `{kind, message, details}` structure
    /// suitable for logging or API re-exposure
    pub fn details(&self) -> Value {
        match self {
            Error::Validation { messages } => json!({
                "kind": "validation",
                "message": self.to_string(),
                "details": { "messages": messages },
            }),
            Error::Authentication { status, code, message } => json!({
                "kind": "authentication",
                "message": message,
                "details": { "status": status, "code": code },
            }),
            Error::Api { status, code, message, kind, body } => json!({
                "kind": "api",
                "message": message,
                "details": {
                    "status": status,
                    "code": code,
                    "class": kind.as_str(),
                    "body": body,
                },
            }),
            other => json!({
                "kind": "internal",
                "message": other.to_string(),
                "details": Value::Null,
            }),
        }
    }
}

/// Result type for API client operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_kind_ranges() {
        assert_eq!(ApiErrorKind::from_code("404"), ApiErrorKind::Client);
        assert_eq!(ApiErrorKind::from_code("500"), ApiErrorKind::Server);
        assert_eq!(ApiErrorKind::from_code("881"), ApiErrorKind::Business);
        assert_eq!(ApiErrorKind::from_code("000"), ApiErrorKind::Business);
        assert_eq!(ApiErrorKind::from_code("not-a-number"), ApiErrorKind::Business);
    }

    #[test]
    fn test_token_expired_predicate() {
        let err = Error::auth(401, None, "token expired");
        assert!(err.is_token_expired());

        let err = Error::auth(500, None, "upstream down");
        assert!(!err.is_token_expired());

        let err = Error::business(200, "881", "invalid item code", Value::Null);
        assert!(!err.is_token_expired());
    }

    #[test]
    fn test_details_shape() {
        let err = Error::Validation {
            messages: vec!["tin: required field is missing".to_string()],
        };
        let details = err.details();
        assert_eq!(details["kind"], "validation");
        assert_eq!(details["details"]["messages"][0], "tin: required field is missing");

        let err = Error::business(200, "881", "bad item", json!({"resultCd": "881"}));
        let details = err.details();
        assert_eq!(details["kind"], "api");
        assert_eq!(details["details"]["code"], "881");
        assert_eq!(details["details"]["body"]["resultCd"], "881");
    }

    #[test]
    fn test_status_code_accessor() {
        assert_eq!(Error::auth(401, None, "x").status_code(), Some(401));
        assert_eq!(
            Error::transport(502, Value::Null, "bad gateway").status_code(),
            Some(502)
        );
        assert_eq!(Error::UnknownEndpoint("x".into()).status_code(), None);
    }
}
