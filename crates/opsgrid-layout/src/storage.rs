//! Storage boundary for persisted layouts.
//!
//! The engine only ever hands storage a serialized record and asks for one
//! back; where it lives is the host's business. Two backends ship here: an
//! in-memory slot (tests, embedding) and a JSON file.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::persist::PersistedLayout;

/// A single-slot key/value store for one dashboard's layout.
pub trait LayoutStorage {
    /// Raw stored text, or `None` if nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored text.
    fn write(&mut self, contents: &str) -> Result<(), StorageError>;
}

/// Serialize and store a layout record.
pub fn write_layout(
    storage: &mut dyn LayoutStorage,
    layout: &PersistedLayout,
) -> Result<(), StorageError> {
    let text = layout.to_json_string().map_err(StorageError::Json)?;
    storage.write(&text)
}

/// In-memory storage slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    contents: Option<String>,
    writes: usize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with stored text.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            writes: 0,
        }
    }

    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of writes since construction.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl LayoutStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        self.contents = Some(contents.to_owned());
        self.writes += 1;
        Ok(())
    }
}

/// Layout stored as a pretty-printed JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayoutStorage for JsonFileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(StorageError::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(StorageError::Io)
    }
}

/// Storage failures.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error on the storage medium.
    Io(std::io::Error),
    /// Record could not be serialized.
    Json(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "layout storage I/O error: {e}"),
            Self::Json(e) => write!(f, "layout serialization error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}
