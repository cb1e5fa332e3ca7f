//! Store configuration.
//!
//! [`StoreConfig`] is built explicitly and handed to [`crate::Store::open`];
//! the store itself never consults the environment. Layering, lowest to
//! highest priority:
//!
//! 1. Built-in defaults (`./data`, single-file mode, `store.ndjson`)
//! 2. An optional TOML file
//! 3. The `FMU_STORAGE_DIR` environment variable (root only, ignored when empty)
//!
//! ```toml
//! root = "/var/lib/fmu"
//! mode = "partitioned"
//! single_file_name = "store.ndjson"
//! ```

use crate::error::{StoreError, StoreResult};
use crate::partition::{Category, parse_file_name};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

/// Environment variable selecting the storage root.
pub const ENV_STORAGE_DIR: &str = "FMU_STORAGE_DIR";

/// Storage root used when nothing else is configured.
pub const DEFAULT_STORAGE_DIR: &str = "./data";

/// File name of the single-file mode store.
pub const DEFAULT_SINGLE_FILE_NAME: &str = "store.ndjson";

/// Which on-disk layout the store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// One file, replaced wholesale on write.
    #[default]
    SingleFile,
    /// One append-only file per category and day.
    Partitioned,
}

/// Configuration for a record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Storage root directory.
    pub root: PathBuf,

    /// Storage layout.
    pub mode: StorageMode,

    /// Name of the single-file mode file inside `root`.
    pub single_file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_STORAGE_DIR),
            mode: StorageMode::default(),
            single_file_name: DEFAULT_SINGLE_FILE_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    /// Defaults with a specific root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Defaults plus the `FMU_STORAGE_DIR` override.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Defaults, then `path` (if given), then the environment, validated.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|e| StoreError::config(path, e.to_string()))?;
                Self::from_toml_str(&content).map_err(|e| match e {
                    StoreError::Config { message, .. } => StoreError::config(path, message),
                    other => other,
                })?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| StoreError::config("<toml>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Priority: config file < **env vars**.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var(ENV_STORAGE_DIR)
            && !dir.is_empty()
        {
            self.root = PathBuf::from(dir);
        }
    }

    /// Reject a `single_file_name` that cannot name a file inside the root,
    /// or that collides with the partition namespace.
    pub fn validate(&self) -> StoreResult<()> {
        let name = self.single_file_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StoreError::config(
                "<config>",
                format!("single_file_name {:?} must be a plain file name", name),
            ));
        }
        if let Some(category) = Category::iter().find(|&c| parse_file_name(c, name).is_some()) {
            return Err(StoreError::config(
                "<config>",
                format!(
                    "single_file_name {:?} would be read as a {} partition",
                    name, category
                ),
            ));
        }
        Ok(())
    }

    /// Path of the single-file mode file.
    pub fn single_file_path(&self) -> PathBuf {
        self.root.join(&self.single_file_name)
    }
}
