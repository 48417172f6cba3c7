//! Manager configuration.
//!
//! Handles loading, validating, and merging `photoshelf.toml`. User values are
//! layered over the stock defaults, so a file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [workers]
//! count = 5                 # Background workers draining the action queue
//! poll_interval_ms = 100    # How long an idle worker waits per poll
//!
//! [thumbnails]
//! max_width = 500           # Bounding box; thumbnails never exceed it
//! max_height = 500
//! quality = 75              # JPEG quality (1-100)
//!
//! [storage]
//! root = "photoshelf-data"  # Directory used by the local drive
//! ```
//!
//! ## Non-positive values
//!
//! Zero or negative numbers are not errors. They mean "use the default" and
//! are normalised by [`ManagerConfig::effective`]:
//!
//! ```toml
//! [workers]
//! count = 0                 # → 5 workers
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, ThumbnailConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up by the CLI when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "photoshelf.toml";

const DEFAULT_WORKERS: i64 = 5;
const DEFAULT_POLL_INTERVAL_MS: i64 = 100;
const DEFAULT_THUMBNAIL_BOUND: i64 = 500;
const DEFAULT_QUALITY: i64 = 75;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `photoshelf.toml`.
///
/// Numbers are signed so that a caller-supplied non-positive value can be
/// represented and then replaced by its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    pub workers: WorkersConfig,
    pub thumbnails: ThumbnailsConfig,
    pub storage: StorageConfig,
}

/// Background worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkersConfig {
    /// Number of worker threads.
    pub count: i64,
    /// Milliseconds an idle worker waits for the next action before polling again.
    pub poll_interval_ms: i64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_WORKERS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub max_width: i64,
    pub max_height: i64,
    /// JPEG encoding quality. Values above 100 are clamped.
    pub quality: i64,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_THUMBNAIL_BOUND,
            max_height: DEFAULT_THUMBNAIL_BOUND,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Storage settings for the bundled local drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("photoshelf-data"),
        }
    }
}

/// Configuration with every default applied, ready to run a manager.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub workers: usize,
    pub poll_interval: Duration,
    pub thumbnails: ThumbnailConfig,
    pub storage_root: PathBuf,
}

/// `value` when positive, otherwise `default`, narrowed to the target type.
fn positive_or<T: TryFrom<i64>>(value: i64, default: i64, max: T) -> T {
    let value = if value > 0 { value } else { default };
    T::try_from(value).unwrap_or(max)
}

impl ManagerConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Non-positive numbers are accepted here; only values that have no
    /// sensible default are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.root must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Normalise non-positive values to their defaults.
    pub fn effective(&self) -> EffectiveConfig {
        let quality = positive_or(self.thumbnails.quality, DEFAULT_QUALITY, u32::MAX);
        EffectiveConfig {
            workers: positive_or(self.workers.count, DEFAULT_WORKERS, usize::MAX),
            poll_interval: Duration::from_millis(positive_or(
                self.workers.poll_interval_ms,
                DEFAULT_POLL_INTERVAL_MS,
                u64::MAX,
            )),
            thumbnails: ThumbnailConfig {
                max_width: positive_or(
                    self.thumbnails.max_width,
                    DEFAULT_THUMBNAIL_BOUND,
                    u32::MAX,
                ),
                max_height: positive_or(
                    self.thumbnails.max_height,
                    DEFAULT_THUMBNAIL_BOUND,
                    u32::MAX,
                ),
                quality: Quality::new(quality),
            },
            storage_root: self.storage.root.clone(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ManagerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ManagerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ManagerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// it does not exist.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<ManagerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `photoshelf.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photoshelf Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Zero or negative numbers fall back to the default.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Background workers
# ---------------------------------------------------------------------------
[workers]
# Number of worker threads draining the action queue.
count = 5

# Milliseconds an idle worker waits for new work before polling again.
poll_interval_ms = 100

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Bounding box. Thumbnails keep the source aspect ratio and are never upscaled.
max_width = 500
max_height = 500

# JPEG encoding quality (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Root directory of the local drive used by the command-line tool.
root = "photoshelf-data"
"##
}
