use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SdkError;

#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    token: String,
}

/// Operator token persisted between console runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/courier/credentials.json`, or the working directory if
    /// the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("courier")
            .join("credentials.json")
    }

    pub fn from_override(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::new(path),
            None => Self::new(Self::default_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>, SdkError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredCredentials = serde_json::from_str(&raw)?;
        if stored.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(stored.token))
    }

    pub fn save(&self, token: &str) -> Result<(), SdkError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&StoredCredentials {
            token: token.to_string(),
        })?;
        std::fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "Token saved");
        Ok(())
    }

    /// Remove the stored token. Missing file is not an error.
    pub fn clear(&self) -> Result<(), SdkError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
