use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Where a [`KeyStorage`](crate::KeyStorage) reads and writes.
///
/// ```toml
/// container = "my-bucket"
/// root = "experiments"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend bucket/container identifier.
    pub container: String,
    /// Namespace prefix inside the container. Empty means no prefix.
    #[serde(default)]
    pub root: String,
}

impl StorageConfig {
    pub fn new(container: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            root: root.into(),
        }
    }

    /// Parse a TOML document. The container must be non-empty.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| StorageError::InvalidArgument(format!("invalid storage config: {e}")))?;
        if config.container.is_empty() {
            return Err(StorageError::InvalidArgument(
                "storage config: container must not be empty".into(),
            ));
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> StorageResult<String> {
        toml::to_string(self)
            .map_err(|e| StorageError::InvalidArgument(format!("cannot encode storage config: {e}")))
    }
}
