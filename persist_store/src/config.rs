//! Store location configuration

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default persistent property directory
pub const DEFAULT_PERSIST_DIR: &str = "/data/property";

/// Default name of the canonical protobuf file inside the directory
pub const DEFAULT_CANONICAL_NAME: &str = "persistent_properties";

/// Where the persistent store lives on disk.
///
/// The legacy layout uses `persist_dir` itself; the binary layout uses the
/// canonical file inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub persist_dir: PathBuf,
    #[serde(default = "default_canonical_name")]
    pub canonical_name: String,
}

fn default_canonical_name() -> String {
    DEFAULT_CANONICAL_NAME.to_string()
}

impl StoreConfig {
    /// Uses `dir` with the default canonical file name
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: dir.into(),
            canonical_name: default_canonical_name(),
        }
    }

    /// Full path of the canonical protobuf file
    pub fn canonical_path(&self) -> PathBuf {
        self.persist_dir.join(&self.canonical_name)
    }

    /// Loads a JSON config file
    pub fn load_from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let data =
            fs::read_to_string(path.as_ref()).map_err(|err| StoreError::io(path.as_ref(), err))?;
        let config: StoreConfig =
            serde_json::from_str(&data).map_err(|err| StoreError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> StoreResult<()> {
        if self.persist_dir.as_os_str().is_empty() {
            return Err(StoreError::Config(
                "persist_dir cannot be empty".to_string(),
            ));
        }
        let name = self.canonical_name.as_str();
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(StoreError::Config(format!(
                "invalid canonical file name: {}",
                name
            )));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_dir(DEFAULT_PERSIST_DIR)
    }
}
