use std::io::ErrorKind;
use std::path::Path;

use super::client::LlmError;

/// Read an API key from `path`. The whole file is the key, minus surrounding
/// whitespace.
pub fn read_api_key(path: &Path) -> Result<String, LlmError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!("Read API key from {}", path.display());
            Ok(contents.trim().to_string())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(LlmError::KeyFileMissing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(LlmError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
