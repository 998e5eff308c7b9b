//! Editor configuration.
//!
//! Every field has a default, so a missing file or a partial JSON object is
//! always usable.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EditorConfig {
    /// Point size palette emojis are drawn at; dropped emojis get this size
    /// divided by the current zoom. Default: **40**.
    pub palette_emoji_size: u32,

    /// Maximum number of undo steps kept. Default: **100**.
    pub undo_depth: usize,

    /// Palette store opened by front ends. Default: **"Main"**.
    pub palette_store: String,

    /// JSON settings file backing palette stores. `None` keeps them in memory.
    pub settings_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            palette_emoji_size: 40,
            undo_depth: 100,
            palette_store: "Main".to_string(),
            settings_path: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
