//! Run configuration.
//!
//! Everything has a stock default, so no file is needed. When `--config
//! <path>` is given, that TOML file is merged over the stock defaults; CLI
//! flags are applied on top of the result in `main`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [processing]
//! size = [128, 128]    # Output width, height in pixels
//! strict = false       # Validate extensions up front, non-zero exit on setup errors
//!
//! [output]
//! progress = true      # Show the progress bar
//!
//! [logging]
//! level = "info"       # error | warn | info | debug | trace
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [processing]
//! size = [224, 224]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::TargetSize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Log levels accepted by `[logging] level` and `--log-level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Full run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    /// Transform settings.
    pub processing: ProcessingConfig,
    /// Console output settings.
    pub output: OutputConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Exact output dimensions as `[width, height]`.
    pub size: TargetSize,
    /// Reject files whose extension cannot hold grayscale output before
    /// decoding them, and exit non-zero on setup errors.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { progress: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PrepConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Sizes are already non-zero by type; only free-form strings need checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PrepConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PrepConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PrepConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an explicit file path.
///
/// Unlike a lookup in a well-known location, a missing file here is an
/// error: the user asked for it by name.
pub fn load_config(path: &Path) -> Result<PrepConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock config file.
pub fn stock_config_toml() -> &'static str {
    r##"# dataset-prep configuration
# ==========================
#
# All options are optional. Command-line flags override these values.

[processing]
# Exact output size as [width, height]. --img_size N sets both to N.
size = [128, 128]
# Reject files whose extension cannot be written as grayscale before
# decoding them, and exit with status 1 when the source directory is missing.
strict = false

[output]
# Show a progress bar on stderr.
progress = true

[logging]
# One of: error, warn, info, debug, trace.
level = "info"
"##
}
