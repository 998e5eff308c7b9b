//! Key-value settings collaborator used to persist palette stores.
//!
//! Access goes through `&self` so several stores can share one backend
//! behind an `Rc`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not a JSON object of strings: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for key {0:?} is not UTF-8")]
    NotUtf8(String),
}

pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SettingsError>;
}

/// Process-local settings, lost on exit.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SettingsError> {
        self.values.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as a single JSON object `{ key: value }` on disk.
///
/// Every `set` rewrites the whole file via a temporary sibling and rename.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: RefCell<BTreeMap<String, String>>,
}

impl FileSettings {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| SettingsError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        Ok(Self {
            path,
            values: RefCell::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io_err = |source: io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(&*self.values.borrow()).map_err(|source| {
            SettingsError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        log::trace!("settings flushed to {}", self.path.display());
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.borrow().get(key).map(|v| v.clone().into_bytes())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), SettingsError> {
        let value = String::from_utf8(value).map_err(|_| SettingsError::NotUtf8(key.to_string()))?;
        self.values.borrow_mut().insert(key.to_string(), value);
        self.flush()
    }
}
