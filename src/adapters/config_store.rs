//! Configuration store adapters.
//!
//! Both implement [`ConfigPort`]:
//!
//! - [`MemoryConfigStore`] keeps a postcard blob in memory, the same shape
//!   a flash key/value partition would hold.  Used by tests and by callers
//!   that want persistence semantics without a filesystem.
//! - [`JsonConfigFile`] reads and writes a human-editable JSON file.  The
//!   host binary points it at `$ENVMON_CONFIG`.
//!
//! Every load and save is range-checked with [`validate_config`]; invalid
//! values are rejected, never clamped.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{CycleConfig, validate_config};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "ENVMON_CONFIG";

/// Upper bound on a stored blob; anything larger is treated as corrupt.
const MAX_BLOB_SIZE: usize = 512;

// ───────────────────────────────────────────────────────────────
// In-memory postcard store
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing serialized blob (e.g. copied off a device).
    pub fn from_blob(bytes: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes)),
        }
    }

    /// Size of the stored blob, if any.
    pub fn stored_len(&self) -> Option<usize> {
        self.blob.borrow().as_ref().map(Vec::len)
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<CycleConfig, ConfigError> {
        let blob = self.blob.borrow();
        let Some(bytes) = blob.as_deref() else {
            info!("MemoryConfigStore: no stored config, using defaults");
            return Ok(CycleConfig::default());
        };
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::Corrupted);
        }
        let cfg: CycleConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        info!("MemoryConfigStore: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &CycleConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("MemoryConfigStore: config saved ({} bytes)", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// JSON file
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File named by `$ENVMON_CONFIG`, or `None` if the variable is unset.
    pub fn from_env() -> Option<Self> {
        std::env::var_os(CONFIG_ENV_VAR).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<CycleConfig, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "JsonConfigFile: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(CycleConfig::default());
            }
            Err(e) => {
                warn!("JsonConfigFile: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let cfg: CycleConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("JsonConfigFile: {} is not valid: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        validate_config(&cfg)?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &CycleConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        std::fs::write(&self.path, text).map_err(|e| {
            warn!("JsonConfigFile: write {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}
