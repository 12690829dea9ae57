use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use courier_core::ErrorCategory;
use courier_sdk::{
    Canceller, CloseReason, CourierClient, ReaderOptions, StreamError, TraceObserver,
};

/// How the mock trace endpoint answers.
#[derive(Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub chunks: Vec<Vec<u8>>,
    /// Pause before each chunk.
    pub chunk_delay: Duration,
    /// Pause before sending response headers.
    pub header_delay: Duration,
    /// Keep the body open after the last chunk.
    pub hold_open: bool,
}

impl MockResponse {
    pub fn ok(chunks: Vec<&[u8]>) -> Self {
        Self {
            status: StatusCode::OK,
            chunks: chunks.into_iter().map(<[u8]>::to_vec).collect(),
            chunk_delay: Duration::ZERO,
            header_delay: Duration::ZERO,
            hold_open: false,
        }
    }

    pub fn body(body: &str) -> Self {
        Self::ok(vec![body.as_bytes()])
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::ok(vec![])
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_header_delay(mut self, delay: Duration) -> Self {
        self.header_delay = delay;
        self
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    response: MockResponse,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process trace endpoint on an ephemeral port.
pub struct MockTraceServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTraceServer {
    pub async fn start(response: MockResponse) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            response,
            hits: hits.clone(),
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/admin/trace", post(trace_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
            requests,
        }
    }

    pub fn trace_url(&self) -> String {
        format!("{}/admin/trace", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn client(&self, token: Option<&str>) -> CourierClient {
        CourierClient::new(self.trace_url(), token.map(str::to_string))
    }

    pub fn client_with(&self, options: ReaderOptions) -> CourierClient {
        self.client(Some("secret")).with_options(options)
    }
}

async fn trace_handler(State(state): State<MockState>, headers: HeaderMap, body: String) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest { headers, body });

    let response = state.response;
    if !response.header_delay.is_zero() {
        tokio::time::sleep(response.header_delay).await;
    }
    if !response.status.is_success() {
        return (response.status, "denied").into_response();
    }

    let stream = async_stream::stream! {
        for chunk in response.chunks {
            if !response.chunk_delay.is_zero() {
                tokio::time::sleep(response.chunk_delay).await;
            }
            yield Ok::<_, Infallible>(chunk);
        }
        if response.hold_open {
            futures::future::pending::<()>().await;
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .expect("mock response")
}

/// Address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}/admin/trace")
}

/// Observer that records everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    pub opened: Vec<u16>,
    pub records: Vec<serde_json::Value>,
    pub unauthorized: usize,
    pub forbidden: usize,
    pub errors: Vec<ErrorCategory>,
    pub closes: Vec<CloseReason>,
    /// Cancel the stream once this many records arrived.
    pub stop_after: Option<(usize, Canceller)>,
}

impl TraceObserver for RecordingObserver {
    fn on_open(&mut self, status: u16) {
        self.opened.push(status);
    }

    fn on_record(&mut self, record: &serde_json::Value) {
        self.records.push(record.clone());
        if let Some((limit, canceller)) = &self.stop_after {
            if self.records.len() >= *limit {
                canceller.cancel();
            }
        }
    }

    fn on_unauthorized(&mut self) {
        self.unauthorized += 1;
    }

    fn on_forbidden(&mut self) {
        self.forbidden += 1;
    }

    fn on_error(&mut self, error: &StreamError) {
        self.errors.push(error.category());
    }

    fn on_close(&mut self, reason: CloseReason) {
        self.closes.push(reason);
    }
}

/// Lines `{"n":0}\n{"n":1}\n...` with a heartbeat every fourth line.
pub fn numbered_body(count: usize) -> String {
    let mut body = String::new();
    for n in 0..count {
        if n % 4 == 3 {
            body.push_str("null\n");
        }
        body.push_str(&format!("{{\"n\":{n}}}\n"));
    }
    body
}
