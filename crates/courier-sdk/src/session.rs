use courier_core::{ErrorCategory, Filter, TraceRecord, TraceRequest, metrics};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::CourierClient;
use crate::error::{SdkError, StreamError};
use crate::event::{CloseReason, StreamEvent};
use crate::reader::{Canceller, StreamReader};

/// Callbacks a trace consumer implements. Heartbeats and records rejected by
/// the session filter never reach `on_record`.
pub trait TraceObserver {
    fn on_open(&mut self, _status: u16) {}

    fn on_record(&mut self, record: &serde_json::Value);

    /// HTTP 401. The caller should re-authenticate.
    fn on_unauthorized(&mut self) {}

    /// HTTP 403.
    fn on_forbidden(&mut self) {}

    /// Every other stream error.
    fn on_error(&mut self, _error: &StreamError) {}

    fn on_close(&mut self, _reason: CloseReason) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    ServerClosed,
    Cancelled,
    Failed(ErrorCategory),
}

impl SessionOutcome {
    /// Only a server-side close is worth reconnecting after. An explicit
    /// stop or a failure ends the session for good.
    pub fn should_reconnect(&self) -> bool {
        matches!(self, SessionOutcome::ServerClosed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub records: u64,
    pub heartbeats: u64,
    pub filtered: u64,
    pub errors: u64,
}

/// One operator trace session. Owns at most one open stream at a time.
pub struct TraceSession {
    id: Uuid,
    client: CourierClient,
    reader: Option<StreamReader>,
    filter: Option<Filter>,
    stats: SessionStats,
}

impl TraceSession {
    pub fn new(client: CourierClient) -> Self {
        Self {
            id: Uuid::now_v7(),
            client,
            reader: None,
            filter: None,
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Validate the request and filter, stop any previous stream, then open
    /// a new one. Nothing is sent if validation fails.
    pub fn start(&mut self, request: TraceRequest, filter: Option<&str>) -> Result<Canceller, SdkError> {
        let filter = filter
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(Filter::compile)
            .transpose()?;
        request.validate()?;

        if self.stop() {
            debug!(session_id = %self.id, "Stopped previous trace stream");
        }

        let reader = self.client.open_trace(&request)?;
        let canceller = reader.canceller();

        info!(
            session_id = %self.id,
            kind = %request.kind,
            entity = %request.entity,
            filter = filter.as_ref().map(Filter::source).unwrap_or(""),
            "Trace session started"
        );

        self.reader = Some(reader);
        self.filter = filter;
        self.stats = SessionStats::default();
        Ok(canceller)
    }

    /// Cancel the active stream, if any. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        match self.reader.take() {
            Some(reader) => {
                reader.cancel();
                true
            }
            None => false,
        }
    }

    pub fn stop_handle(&self) -> Option<Canceller> {
        self.reader.as_ref().map(StreamReader::canceller)
    }

    pub fn is_active(&self) -> bool {
        self.reader.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Deliver events of the active stream to `observer` until it ends.
    pub async fn run<O>(&mut self, observer: &mut O) -> Result<SessionOutcome, SdkError>
    where
        O: TraceObserver + ?Sized,
    {
        let reader = self.reader.as_mut().ok_or(SdkError::NotStarted)?;
        // A stream that ends without a close event lost its reader task.
        let mut outcome = SessionOutcome::Failed(ErrorCategory::Transport);

        while let Some(event) = reader.next_event().await {
            match event {
                StreamEvent::Open { status } => observer.on_open(status),
                StreamEvent::Message(TraceRecord::Heartbeat) => {
                    self.stats.heartbeats += 1;
                }
                StreamEvent::Message(TraceRecord::Data(value)) => {
                    let passes = self.filter.as_ref().is_none_or(|f| f.matches(&value));
                    if passes {
                        self.stats.records += 1;
                        observer.on_record(&value);
                    } else {
                        self.stats.filtered += 1;
                        metrics::record_filtered();
                    }
                }
                StreamEvent::Error(error) => {
                    self.stats.errors += 1;
                    let category = error.category();
                    match category {
                        ErrorCategory::Unauthorized => observer.on_unauthorized(),
                        ErrorCategory::Forbidden => observer.on_forbidden(),
                        _ => observer.on_error(&error),
                    }
                    outcome = SessionOutcome::Failed(category);
                }
                StreamEvent::Close(reason) => {
                    observer.on_close(reason);
                    outcome = match reason {
                        CloseReason::ServerClosed => SessionOutcome::ServerClosed,
                        CloseReason::Cancelled => SessionOutcome::Cancelled,
                    };
                }
            }
        }

        self.reader = None;
        info!(
            session_id = %self.id,
            records = self.stats.records,
            filtered = self.stats.filtered,
            heartbeats = self.stats.heartbeats,
            outcome = ?outcome,
            "Trace session ended"
        );
        Ok(outcome)
    }
}
