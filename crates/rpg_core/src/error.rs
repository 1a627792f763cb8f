//! Engine-wide error taxonomy.
//!
//! Asset failures are usually recoverable (callers log and degrade to a
//! placeholder), while `RendererInit` is only ever produced during startup
//! and aborts the process.

use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("asset missing: {path}: {reason}")]
    AssetMissing { path: String, reason: String },

    #[error("failed to decode {path}: {reason}")]
    AssetDecode { path: String, reason: String },

    #[error("renderer initialization failed: {0}")]
    RendererInit(String),

    #[error("precondition failed: {0}")]
    LogicPrecondition(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn missing(path: impl AsRef<Path>, reason: impl Display) -> Self {
        Self::AssetMissing {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(path: impl AsRef<Path>, reason: impl Display) -> Self {
        Self::AssetDecode {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn precondition(reason: impl Display) -> Self {
        Self::LogicPrecondition(reason.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::AssetMissing { .. })
    }
}
