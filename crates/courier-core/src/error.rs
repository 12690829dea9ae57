use thiserror::Error;

use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid trace request: {0}")]
    InvalidTraceRequest(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Config error: {0}")]
    Config(#[from] figment::Error),
}

/// Failure categories the console reports to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 401: the stored credential is missing or expired.
    Unauthorized,
    /// 403: the credential lacks permission for the request.
    Forbidden,
    /// Any other non-success HTTP status.
    Http,
    /// Connection, DNS, timeout or body read failure.
    Transport,
    /// A streamed line was not valid JSON.
    Protocol,
    /// Rejected locally before any network activity.
    Validation,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Http => "http",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Validation => "validation",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            _ => Self::Http,
        }
    }

    /// Operator-facing notice for this category.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Session expired or missing, please log in again",
            Self::Forbidden => "Permission denied",
            Self::Http => "Server rejected the trace request",
            Self::Transport => "Connection to the server failed",
            Self::Protocol => "Server sent a malformed trace record",
            Self::Validation => "Invalid trace parameters",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&CoreError> for ErrorCategory {
    fn from(_: &CoreError) -> Self {
        ErrorCategory::Validation
    }
}
