use courier_core::TraceRecord;

use crate::error::StreamError;

/// Lifecycle and data events of one trace stream, in arrival order.
#[derive(Debug)]
pub enum StreamEvent {
    /// The server accepted the request with a success status.
    Open { status: u16 },
    /// One complete line of the body, decoded.
    Message(TraceRecord),
    Error(StreamError),
    Close(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The response body ended.
    ServerClosed,
    /// The caller stopped the stream.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Connecting,
    Streaming,
    Closed,
    Errored,
}

impl ReaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReaderState::Closed | ReaderState::Errored)
    }

    pub fn can_transition_to(&self, next: ReaderState) -> bool {
        use ReaderState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Idle, Closed)
                | (Connecting, Streaming)
                | (Connecting, Closed)
                | (Connecting, Errored)
                | (Streaming, Closed)
                | (Streaming, Errored)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderState::Idle => "idle",
            ReaderState::Connecting => "connecting",
            ReaderState::Streaming => "streaming",
            ReaderState::Closed => "closed",
            ReaderState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ReaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
