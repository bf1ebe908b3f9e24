//! Error types for coordinator requests.

use thiserror::Error;

/// Errors that can occur when talking to the coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The coordinator answered with a non-2xx status.
    #[error("coordinator returned {status}")]
    Rejected { status: u16, body: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The configured coordinator address is not a usable base URL.
    #[error("Invalid coordinator address: {0}")]
    InvalidUrl(String),

    /// The active source cannot send commands.
    #[error("Source is read-only: {0}")]
    ReadOnly(String),
}

impl CoordinatorError {
    /// What the operator sees in the error dialog.
    ///
    /// For a rejected request that is the coordinator's own body, otherwise
    /// the error message.
    pub fn detail(&self) -> ErrorBody {
        match self {
            CoordinatorError::Rejected { status, body } if body.trim().is_empty() => {
                ErrorBody::Text(format!("coordinator returned {}", status))
            }
            CoordinatorError::Rejected { body, .. } => ErrorBody::from_raw(body),
            other => ErrorBody::Text(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for CoordinatorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CoordinatorError::Timeout
        } else if err.is_connect() {
            CoordinatorError::Connection(err.to_string())
        } else if err.is_decode() {
            CoordinatorError::Parse(err.to_string())
        } else {
            CoordinatorError::Http(err.to_string())
        }
    }
}

/// An error payload prepared for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// Structured payload, pretty-printed.
    Json(String),
    /// Plain text, shown verbatim.
    Text(String),
}

impl ErrorBody {
    pub fn from_raw(body: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                match serde_json::to_string_pretty(&value) {
                    Ok(pretty) => ErrorBody::Json(pretty),
                    Err(_) => ErrorBody::Text(body.to_string()),
                }
            }
            _ => ErrorBody::Text(body.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorBody::Json(s) | ErrorBody::Text(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_is_pretty_printed() {
        let body = ErrorBody::from_raw(r#"{"Cause":"group-[1] already exists","Stack":null}"#);
        match body {
            ErrorBody::Json(text) => {
                assert!(text.contains('\n'));
                assert!(text.contains("\"Cause\": \"group-[1] already exists\""));
            }
            other => panic!("expected json, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_body_is_verbatim() {
        assert_eq!(
            ErrorBody::from_raw("invalid xauth, please check product name"),
            ErrorBody::Text("invalid xauth, please check product name".to_string())
        );
        // A bare JSON string is not a structured payload
        assert_eq!(
            ErrorBody::from_raw(r#""oops""#),
            ErrorBody::Text(r#""oops""#.to_string())
        );
    }

    #[test]
    fn test_detail() {
        let rejected = CoordinatorError::Rejected {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(rejected.detail().as_str(), "boom");

        let empty = CoordinatorError::Rejected {
            status: 502,
            body: String::new(),
        };
        assert_eq!(empty.detail().as_str(), "coordinator returned 502");

        assert_eq!(CoordinatorError::Timeout.detail().as_str(), "Request timed out");
    }
}
