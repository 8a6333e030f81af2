//! Error types and user-facing notices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Stage;

/// Errors from driving the state machine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Username is required before starting the flow")]
    MissingUsername,

    #[error("Cannot {action} while in stage {from}")]
    InvalidTransition { from: Stage, action: &'static str },
}

/// Errors from the analysis backend call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend did not answer within {0}s")]
    TimedOut(u64),

    #[error("Backend error (HTTP {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Convenience result type.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A message the host should show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    UsernameRequired,
    ServerError(String),
    ConnectionFailed(String),
    MalformedResponse,
    TimedOut(u64),
}

impl From<&AnalysisError> for Notice {
    fn from(e: &AnalysisError) -> Self {
        match e {
            AnalysisError::Transport(detail) => Notice::ConnectionFailed(detail.clone()),
            AnalysisError::TimedOut(secs) => Notice::TimedOut(*secs),
            AnalysisError::Server { message, .. } => Notice::ServerError(
                message
                    .clone()
                    .unwrap_or_else(|| "An unknown server error occurred.".to_string()),
            ),
            AnalysisError::Malformed(_) => Notice::MalformedResponse,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UsernameRequired => f.write_str("Please enter your username first."),
            Notice::ServerError(msg) => write!(f, "Analysis failed: the server reported: {msg}"),
            Notice::ConnectionFailed(detail) => write!(
                f,
                "Could not reach the analysis backend ({detail}). Check that it is running and the address is correct."
            ),
            Notice::MalformedResponse => f.write_str(
                "Analysis failed: the server response did not contain the expected metrics.",
            ),
            Notice::TimedOut(secs) => write!(
                f,
                "Analysis failed: the server did not answer within {secs} seconds."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_notice_defaults_message() {
        let e = AnalysisError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(
            Notice::from(&e),
            Notice::ServerError("An unknown server error occurred.".into())
        );
        assert_eq!(e.to_string(), "Backend error (HTTP 500): no message");
    }

    #[test]
    fn test_notice_distinguishes_failure_kinds() {
        let transport = Notice::from(&AnalysisError::Transport("refused".into()));
        let malformed = Notice::from(&AnalysisError::Malformed("no results".into()));
        assert!(transport.to_string().contains("refused"));
        assert_eq!(malformed, Notice::MalformedResponse);
    }
}
