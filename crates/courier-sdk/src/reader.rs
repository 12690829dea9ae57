use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use courier_core::{ParseErrorPolicy, TraceConfig, TraceRecord, metrics};
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::event::{CloseReason, ReaderState, StreamEvent};
use crate::framing::LineFramer;

/// Everything needed to issue one streaming request.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Decoded events buffered ahead of the consumer.
    pub channel_capacity: usize,
    /// Upper bound on waiting for response headers.
    pub connect_timeout: Duration,
    pub on_parse_error: ParseErrorPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            connect_timeout: Duration::from_secs(10),
            on_parse_error: ParseErrorPolicy::Terminate,
        }
    }
}

impl From<&TraceConfig> for ReaderOptions {
    fn from(config: &TraceConfig) -> Self {
        Self {
            channel_capacity: config.channel_capacity,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            on_parse_error: config.on_parse_error,
        }
    }
}

/// Idempotent stop handle for one stream. Clones share the same stream.
#[derive(Debug, Clone)]
pub struct Canceller {
    cancelled: Arc<AtomicBool>,
    signal: Arc<watch::Sender<bool>>,
    state: Arc<watch::Sender<ReaderState>>,
}

impl Canceller {
    /// Abort the stream. Returns `false` if it was already cancelled.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.signal.send_replace(true);
        transition(&self.state, ReaderState::Closed);
        debug!("Trace stream cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle to one open trace stream.
///
/// Dropping the handle cancels the stream.
pub struct StreamReader {
    events: mpsc::Receiver<StreamEvent>,
    canceller: Canceller,
    state: watch::Receiver<ReaderState>,
    cancel_reported: bool,
    /// A terminal event (or end of channel) was already handed out.
    finished: bool,
    on_parse_error: ParseErrorPolicy,
}

impl StreamReader {
    /// Issue the request and start reading its body on a background task.
    ///
    /// Must be called within a tokio runtime.
    pub fn open(http: &reqwest::Client, request: StreamRequest, options: ReaderOptions) -> Self {
        let (event_tx, events) = mpsc::channel(options.channel_capacity.max(1));
        let (signal_tx, signal_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ReaderState::Idle);
        let state_tx = Arc::new(state_tx);

        let canceller = Canceller {
            cancelled: Arc::new(AtomicBool::new(false)),
            signal: Arc::new(signal_tx),
            state: state_tx.clone(),
        };

        debug!(url = %request.url, method = %request.method, "Opening trace stream");
        let builder = http
            .request(request.method, &request.url)
            .headers(request.headers)
            .json(&request.body);

        let on_parse_error = options.on_parse_error;
        transition(&state_tx, ReaderState::Connecting);
        tokio::spawn(read_stream(builder, options, event_tx, signal_rx, state_tx));

        Self {
            events,
            canceller,
            state: state_rx,
            cancel_reported: false,
            finished: false,
            on_parse_error,
        }
    }

    /// Next event, or `None` once the stream has ended.
    ///
    /// After [`cancel`](Self::cancel) this yields a single
    /// `Close(Cancelled)` and then `None`, dropping anything still queued.
    /// A stream that already ended on its own reports nothing more.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.canceller.is_cancelled() {
            return self.report_cancel();
        }

        let event = self.events.recv().await;

        if self.canceller.is_cancelled() {
            return self.report_cancel();
        }

        match &event {
            None | Some(StreamEvent::Close(_)) => self.finished = true,
            Some(StreamEvent::Error(error)) if self.ends_stream(error) => self.finished = true,
            _ => {}
        }
        event
    }

    /// Whether `error` is the last event of its stream. A skipped decode
    /// error may still be followed by more records and a close.
    fn ends_stream(&self, error: &StreamError) -> bool {
        !matches!(
            (error, self.on_parse_error),
            (StreamError::Decode { .. }, ParseErrorPolicy::Skip)
        )
    }

    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> ReaderState {
        *self.state.borrow()
    }

    fn report_cancel(&mut self) -> Option<StreamEvent> {
        if self.cancel_reported || self.finished {
            return None;
        }
        self.cancel_reported = true;
        self.events.close();
        Some(StreamEvent::Close(CloseReason::Cancelled))
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

/// Move to `next` unless the current state forbids it. Terminal states stick.
fn transition(state: &watch::Sender<ReaderState>, next: ReaderState) -> bool {
    state.send_if_modified(|current| {
        if current.can_transition_to(next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

async fn wait_cancelled(signal: &mut watch::Receiver<bool>) {
    // A dropped sender means every handle is gone; treat it as a cancel.
    let _ = signal.wait_for(|cancelled| *cancelled).await;
}

/// Hand one event to the consumer. `false` means stop reading.
async fn emit(
    events: &mpsc::Sender<StreamEvent>,
    signal: &mut watch::Receiver<bool>,
    event: StreamEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = wait_cancelled(signal) => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

async fn fail(
    events: &mpsc::Sender<StreamEvent>,
    signal: &mut watch::Receiver<bool>,
    state: &watch::Sender<ReaderState>,
    error: StreamError,
) {
    metrics::record_stream_error(error.category().as_str());
    if transition(state, ReaderState::Errored) {
        warn!(error = %error, "Trace stream failed");
        emit(events, signal, StreamEvent::Error(error)).await;
    }
}

async fn read_stream(
    request: RequestBuilder,
    options: ReaderOptions,
    events: mpsc::Sender<StreamEvent>,
    mut signal: watch::Receiver<bool>,
    state: Arc<watch::Sender<ReaderState>>,
) {
    let sent = tokio::select! {
        biased;
        _ = wait_cancelled(&mut signal) => return,
        sent = tokio::time::timeout(options.connect_timeout, request.send()) => sent,
    };

    let response = match sent {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return fail(&events, &mut signal, &state, StreamError::Transport(e)).await,
        Err(_) => return fail(&events, &mut signal, &state, StreamError::Timeout).await,
    };

    let status = response.status();
    if !status.is_success() {
        let error = StreamError::Status(status.as_u16());
        return fail(&events, &mut signal, &state, error).await;
    }

    if !transition(&state, ReaderState::Streaming) {
        return;
    }
    info!(status = status.as_u16(), "Trace stream open");
    if !emit(&events, &mut signal, StreamEvent::Open { status: status.as_u16() }).await {
        return;
    }

    let mut body = response.bytes_stream();
    let mut framer = LineFramer::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = wait_cancelled(&mut signal) => return,
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                return fail(&events, &mut signal, &state, StreamError::Transport(e)).await;
            }
            None => break,
        };

        for line in framer.push(&chunk) {
            if line.trim().is_empty() {
                continue;
            }

            match TraceRecord::from_line(&line) {
                Ok(record) => {
                    if record.is_heartbeat() {
                        metrics::record_heartbeat();
                    } else {
                        metrics::record_trace_record();
                    }
                    if !emit(&events, &mut signal, StreamEvent::Message(record)).await {
                        return;
                    }
                }
                Err(source) => {
                    let error = StreamError::Decode { line, source };
                    match options.on_parse_error {
                        ParseErrorPolicy::Terminate => {
                            return fail(&events, &mut signal, &state, error).await;
                        }
                        ParseErrorPolicy::Skip => {
                            metrics::record_stream_error(error.category().as_str());
                            warn!(error = %error, "Skipping malformed trace record");
                            if !emit(&events, &mut signal, StreamEvent::Error(error)).await {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(rest) = framer.finish() {
        warn!(bytes = rest.len(), "Discarding unterminated trailing line");
    }
    if transition(&state, ReaderState::Closed) {
        info!("Trace stream closed by server");
        emit(&events, &mut signal, StreamEvent::Close(CloseReason::ServerClosed)).await;
    }
}
