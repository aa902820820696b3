use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::queue::QueueConfig;
use crate::retry::RetryPolicy;

/// Backoff tuning (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Upper bound of the random jitter as a fraction of each backoff delay.
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { jitter_ratio: 0.3 }
    }
}

/// Global configuration loaded from `~/.config/sheetq/config.toml`.
///
/// Values are read once when a queue is constructed; changing the file does
/// not affect a running queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetqConfig {
    /// Maximum number of concurrently active remote calls.
    pub concurrency_limit: usize,
    /// Default retries per request beyond the first attempt.
    pub retry_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_retry_delay_ms: u64,
    /// Optional backoff tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for SheetqConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 3,
            retry_attempts: 3,
            base_retry_delay_ms: 1000,
            retry: None,
        }
    }
}

impl From<&SheetqConfig> for QueueConfig {
    fn from(cfg: &SheetqConfig) -> Self {
        let retry = cfg.retry.clone().unwrap_or_default();
        QueueConfig {
            concurrency_limit: cfg.concurrency_limit,
            retry_attempts: cfg.retry_attempts,
            retry: RetryPolicy {
                base_delay: Duration::from_millis(cfg.base_retry_delay_ms),
                jitter_ratio: retry.jitter_ratio.max(0.0),
            },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sheetq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SheetqConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<SheetqConfig> {
    if !path.exists() {
        let default_cfg = SheetqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(path)
}

pub fn load_from_path(path: &Path) -> Result<SheetqConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SheetqConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
