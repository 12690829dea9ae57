//! Operator filter expressions over trace records.
//!
//! A filter is compiled once, before a trace stream starts, and then
//! evaluated against every decoded record. Compilation is the only place
//! errors are reported; evaluation never fails.
//!
//! ```text
//! channel startswith "chat:" and not (data.kind in ["join", "leave"])
//! user == "42" || info.latency_ms >= 250
//! ```
//!
//! Paths use dot notation with `[n]` indexes (`data.items[0].id`). A path
//! that does not resolve evaluates as `null`. A bare operand is true unless
//! it is `null`, `false`, `0`, `""`, `[]` or `{}`.

mod eval;
mod lexer;
mod parser;

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Filter expression is empty")]
    Empty,

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("Invalid escape '\\{ch}' at position {pos}")]
    InvalidEscape { ch: char, pos: usize },

    #[error("Invalid number '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("Unexpected '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("Unexpected end of filter expression")]
    UnexpectedEnd,

    #[error("Filter nests deeper than {max} levels at position {pos}", max = parser::MAX_DEPTH)]
    TooDeep { pos: usize },
}

impl FilterError {
    /// Byte offset of the offending input, when there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            FilterError::UnexpectedChar { pos, .. }
            | FilterError::UnterminatedString { pos }
            | FilterError::InvalidEscape { pos, .. }
            | FilterError::InvalidNumber { pos, .. }
            | FilterError::UnexpectedToken { pos, .. }
            | FilterError::TooDeep { pos } => Some(*pos),
            FilterError::Empty | FilterError::UnexpectedEnd => None,
        }
    }
}

/// A compiled filter expression.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: parser::Expr,
}

impl Filter {
    pub fn compile(source: &str) -> Result<Self, FilterError> {
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Whether the record passes the filter.
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        self.expr.eval(record)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}
