//! Settings loaded from `hybrid-rag.toml`.
//!
//! Every field has a default, so a missing file (or a file that only sets a
//! few keys) is valid. Only a file that exists but fails to parse is an error.

use crate::core::error::HybridRagError;
use crate::rag::schema_digest::DEFAULT_SAMPLE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "hybrid-rag.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub audit: AuditSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub db_path: PathBuf,
    /// Sample rows per table in the schema digest
    pub sample_size: usize,
    /// Executor stops reading after this many rows
    pub row_limit: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/sql/music.db"),
            sample_size: DEFAULT_SAMPLE_SIZE,
            row_limit: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub corpus_dir: PathBuf,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub dimensions: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("data/docs"),
            top_k: 2,
            chunk_size: 512,
            chunk_overlap: 50,
            dimensions: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    /// External program that reads a prompt on stdin and prints the completion
    pub command: String,
    /// Arguments for `command`; `{model}` is replaced with `model`
    pub args: Vec<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            command: "llm".to_string(),
            args: vec!["-m".to_string(), "{model}".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditSettings {
    pub events_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// `compact` or `json`
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, HybridRagError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| HybridRagError::ConfigError(e.to_string()))?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), HybridRagError> {
        if self.store.row_limit == 0 {
            return Err(HybridRagError::ConfigError(
                "store.row_limit must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(HybridRagError::ConfigError(
                "retrieval.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(HybridRagError::ConfigError(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }
        if self.retrieval.dimensions == 0 {
            return Err(HybridRagError::ConfigError(
                "retrieval.dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `path`, or from `hybrid-rag.toml` under `dir` when no
/// explicit path is given. An explicit path that does not exist is an error;
/// a missing default file is not.
pub fn load_settings(explicit: Option<&Path>, dir: &Path) -> Result<Settings, HybridRagError> {
    let (config_path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (dir.join(DEFAULT_CONFIG_FILE), false),
    };

    if !config_path.exists() {
        if required {
            return Err(HybridRagError::ConfigError(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&config_path)?;
    Settings::from_toml_str(&content)
}
