use crate::error::{EngineError, EngineResult};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Reads `path` and decodes it as JSON. A missing or unreadable file is
/// `AssetMissing`, malformed content is `AssetDecode`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let raw = fs::read_to_string(path).map_err(|e| EngineError::missing(path, e))?;
    serde_json::from_str(&raw).map_err(|e| EngineError::decode(path, e))
}
