//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory cached files are stored in. `None` selects the per-user
    /// cache directory for the current platform.
    pub cache_dir: Option<PathBuf>,
    /// Maximum number of transfers running at the same time.
    pub max_concurrent_downloads: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_concurrent_downloads: 3,
            request_timeout_secs: 60,
            user_agent: format!("vidcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Invalid config file {path:?}: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
