//! Engine configuration (§6, §10.3).
//!
//! An owned, immutable value handed to the engine at construction — not a
//! process-wide singleton. Hot-reload, where wired up by a caller, replaces
//! the `Arc<EngineConfig>` a running engine holds between runs; the engine
//! itself never reads a global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

const THIRTY_DAYS_MS: i64 = 30 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indexer_enabled: bool,
    pub instant_indexing_limit: usize,
    pub full_update_interval_ms: i64,
    pub full_update_limit: usize,
    pub delta_update_limit: usize,
    pub upsert_batch: usize,
    pub delete_batch: usize,
    pub query_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            indexer_enabled: true,
            instant_indexing_limit: 1000,
            full_update_interval_ms: THIRTY_DAYS_MS,
            full_update_limit: 10_000,
            delta_update_limit: 1000,
            upsert_batch: 50,
            delete_batch: 500,
            query_batch: 100,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, falling back field-by-field to the defaults
    /// above for anything the file omits. A missing file is not an error —
    /// callers that want strict validation should check existence first.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| SyncError::SettingsIoError(format!("invalid config at {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
            Err(e) => Err(SyncError::from(e)),
        }
    }

    /// Default on-disk location, following the `dirs`-crate convention used
    /// elsewhere in this lineage for per-app data directories. Callers are
    /// never required to use this — the engine always takes an explicit
    /// config value, never reads this path implicitly.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_local_dir().map(|dir| dir.join("cp2-index-sync").join("config.toml"))
    }
}
