use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single JSON document kept in one file. The whole document is read and
/// written at once.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file at the configured path. A missing file is an empty
    /// object.
    pub fn load(&self) -> Result<Value, StoreError> {
        if !self.path.exists() {
            tracing::debug!("{} does not exist, starting empty", self.path.display());
            return Ok(Value::Object(Map::new()));
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file with `data`, pretty-printed with 4-space indentation.
    /// Non-ASCII text is written as-is. Not atomic.
    pub fn save(&self, data: &Value) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        data.serialize(&mut ser)?;

        std::fs::write(&self.path, buf)?;
        tracing::debug!("Saved JSON document to {}", self.path.display());
        Ok(())
    }
}
