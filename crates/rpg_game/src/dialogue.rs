use crate::assets::{collect_files, normalize_path};
use rpg_core::json::load_json;
use rpg_core::{EngineError, EngineResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DialogueMessage {
    pub text_message: String,
    /// Elapsed-clock units between revealed characters.
    #[serde(default)]
    pub text_rate: f64,
    #[serde(default)]
    pub can_skip: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DialogueScript {
    pub messages: Vec<DialogueMessage>,
}

pub fn load_dialogue_from_path(path: &Path) -> EngineResult<DialogueScript> {
    let script: DialogueScript = load_json(path)?;
    validate_dialogue(&script).map_err(|reason| EngineError::decode(path, reason))?;
    Ok(script)
}

fn validate_dialogue(script: &DialogueScript) -> Result<(), String> {
    for (i, message) in script.messages.iter().enumerate() {
        if !message.text_rate.is_finite() || message.text_rate < 0.0 {
            return Err(format!(
                "Dialogue validation failed: message {i} has invalid text_rate {}",
                message.text_rate
            ));
        }
    }
    Ok(())
}

/// Parsed dialogue scripts keyed by normalised path.
#[derive(Debug, Default)]
pub struct DialogueLibrary {
    scripts: HashMap<String, Arc<DialogueScript>>,
}

impl DialogueLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` under `root`. Broken scripts are logged and
    /// skipped; returns how many loaded.
    pub fn preload_dir(&mut self, root: &Path) -> usize {
        let mut loaded = 0;
        for path in collect_files(root, "json") {
            match self.load(&path) {
                Ok(_) => loaded += 1,
                Err(err) => log::warn!("Skipping dialogue script: {err}"),
            }
        }
        log::info!("Dialogue scripts preloaded: {loaded} from {}", root.display());
        loaded
    }

    /// Cached script, loading it on first request.
    pub fn get(&mut self, path: &str) -> EngineResult<Arc<DialogueScript>> {
        let key = normalize_path(Path::new(path));
        if let Some(script) = self.scripts.get(&key) {
            return Ok(script.clone());
        }
        self.load(Path::new(path))
    }

    fn load(&mut self, path: &Path) -> EngineResult<Arc<DialogueScript>> {
        let script = Arc::new(load_dialogue_from_path(path)?);
        self.scripts.insert(normalize_path(path), script.clone());
        Ok(script)
    }

    #[cfg(test)]
    pub fn contains(&self, path: &str) -> bool {
        self.scripts.contains_key(&normalize_path(Path::new(path)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }
}
