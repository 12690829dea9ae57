use courier_core::{CoreError, ErrorCategory, FilterError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Credentials error: {0}")]
    Credentials(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No trace session is active")]
    NotStarted,
}

impl SdkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SdkError::Core(_) | SdkError::InvalidFilter(_) | SdkError::NotStarted => {
                ErrorCategory::Validation
            }
            SdkError::Http(_) | SdkError::Credentials(_) => ErrorCategory::Transport,
            SdkError::Serialization(_) => ErrorCategory::Protocol,
        }
    }
}

/// Failure surfaced as an `error` event on a trace stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Timed out waiting for the server to respond")]
    Timeout,

    #[error("Malformed trace record: {source}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Status(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Status(code) => ErrorCategory::from_status(*code),
            StreamError::Transport(_) | StreamError::Timeout => ErrorCategory::Transport,
            StreamError::Decode { .. } => ErrorCategory::Protocol,
        }
    }
}
