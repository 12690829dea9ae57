pub mod client;
pub mod credentials;
pub mod error;
pub mod event;
pub mod framing;
pub mod reader;
pub mod retry;
pub mod session;

pub use client::CourierClient;
pub use credentials::TokenStore;
pub use error::{SdkError, StreamError};
pub use event::{CloseReason, ReaderState, StreamEvent};
pub use framing::LineFramer;
pub use reader::{Canceller, ReaderOptions, StreamReader, StreamRequest};
pub use retry::RetryPolicy;
pub use session::{SessionOutcome, SessionStats, TraceObserver, TraceSession};
