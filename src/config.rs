use crate::api::ClientConfig;
use crate::builder::{BuilderStore, DEFAULT_FABLE_NAME};
use crate::error::FableFileError;
use crate::graph::LayoutOptions;
use crate::validation::{DEFAULT_DEBOUNCE, FableValidator, ValidationHandle, ValidationWorker};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// Settings for a builder session. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub default_fable_name: String,
    /// Quiet period after the last edit before a fable is validated.
    pub validation_debounce_ms: u64,
    pub layout: LayoutOptions,
    pub client: ClientConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_fable_name: DEFAULT_FABLE_NAME.to_string(),
            validation_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            layout: LayoutOptions::default(),
            client: ClientConfig::default(),
        }
    }
}

impl BuilderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, FableFileError> {
        serde_json::from_str(json).map_err(|e| FableFileError::Parse(e.to_string()))
    }

    pub fn from_file(path: &str) -> Result<Self, FableFileError> {
        let content = fs::read_to_string(path).map_err(|e| FableFileError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }

    /// An empty store using this config's default fable name.
    pub fn new_store(&self) -> BuilderStore {
        BuilderStore::with_default_name(self.default_fable_name.clone())
    }

    /// Starts validating `store` in the background with this config's debounce.
    pub fn spawn_validation<V: FableValidator + 'static>(
        &self,
        validator: Arc<V>,
        store: &BuilderStore,
    ) -> ValidationHandle {
        ValidationWorker::spawn(validator, store.subscribe(), self.debounce())
    }
}
