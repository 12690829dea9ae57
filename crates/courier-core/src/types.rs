use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// What a trace session observes on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    User,
    Channel,
    Publication,
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Publication => "publication",
        }
    }
}

impl FromStr for TraceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "channel" => Ok(Self::Channel),
            "publication" => Ok(Self::Publication),
            other => Err(CoreError::InvalidTraceRequest(format!(
                "unknown trace type '{other}', expected user, channel or publication"
            ))),
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of the trace request: `{"type": "user", "entity": "42"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRequest {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub entity: String,
}

impl TraceRequest {
    pub fn new(kind: TraceKind, entity: impl Into<String>) -> Self {
        Self {
            kind,
            entity: entity.into(),
        }
    }

    pub fn user(entity: impl Into<String>) -> Self {
        Self::new(TraceKind::User, entity)
    }

    pub fn channel(entity: impl Into<String>) -> Self {
        Self::new(TraceKind::Channel, entity)
    }

    pub fn publication(entity: impl Into<String>) -> Self {
        Self::new(TraceKind::Publication, entity)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.entity.trim().is_empty() {
            return Err(CoreError::InvalidTraceRequest(format!(
                "{} trace requires a non-empty entity",
                self.kind
            )));
        }
        Ok(())
    }
}

/// One decoded line of a trace stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    /// The server keep-alive, sent on the wire as the literal `null`.
    Heartbeat,
    Data(serde_json::Value),
}

impl TraceRecord {
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        Ok(match value {
            serde_json::Value::Null => Self::Heartbeat,
            value => Self::Data(value),
        })
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat)
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Heartbeat => None,
            Self::Data(value) => Some(value),
        }
    }

    pub fn into_data(self) -> Option<serde_json::Value> {
        match self {
            Self::Heartbeat => None,
            Self::Data(value) => Some(value),
        }
    }
}
