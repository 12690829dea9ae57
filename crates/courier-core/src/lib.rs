pub mod config;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod types;

pub use config::*;
pub use error::{CoreError, ErrorCategory};
pub use filter::{Filter, FilterError};
pub use types::*;
