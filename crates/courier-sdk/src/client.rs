use courier_core::{ConsoleConfig, TraceRequest, metrics};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use tracing::warn;

use crate::error::SdkError;
use crate::reader::{ReaderOptions, StreamReader, StreamRequest};

/// Client for the messaging server's admin trace endpoint.
#[derive(Clone)]
pub struct CourierClient {
    http: Client,
    trace_url: String,
    token: Option<String>,
    options: ReaderOptions,
}

impl CourierClient {
    pub fn new(trace_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            trace_url: trace_url.into(),
            token,
            options: ReaderOptions::default(),
        }
    }

    pub fn from_config(config: &ConsoleConfig, token: Option<String>) -> Self {
        Self::new(config.trace_url(), token).with_options(ReaderOptions::from(&config.trace))
    }

    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn trace_url(&self) -> &str {
        &self.trace_url
    }

    /// Build the streaming POST for a trace request.
    pub fn trace_request(&self, request: &TraceRequest) -> Result<StreamRequest, SdkError> {
        request.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match &self.token {
            Some(token) => match HeaderValue::from_str(&format!("Token {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                // The server will answer 401 and the caller re-authenticates.
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            },
            None => warn!("No stored token, trace request will be unauthenticated"),
        }

        Ok(StreamRequest {
            url: self.trace_url.clone(),
            method: Method::POST,
            headers,
            body: serde_json::to_value(request)?,
        })
    }

    /// Open a trace stream. Validation errors are returned before any
    /// request is sent.
    pub fn open_trace(&self, request: &TraceRequest) -> Result<StreamReader, SdkError> {
        let stream_request = self.trace_request(request)?;
        metrics::record_stream_opened(request.kind.as_str());
        Ok(StreamReader::open(
            &self.http,
            stream_request,
            self.options.clone(),
        ))
    }
}
