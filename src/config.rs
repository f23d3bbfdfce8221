//! Resizer configuration module.
//!
//! Handles loading, validating, and merging `resizer.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! # temp_dir = "/tmp/resizer"          # Scratch folder (default: OS temp dir)
//! output_name = "tempResizedImage.jpg"  # File name of the final JPEG
//! copy_suffix = "ResizerCopy"           # Appended to the staged copy's stem
//!
//! [defaults]
//! max_side = 1920                       # Longer side of the result, in pixels
//! quality = 80                          # JPEG quality (0 = maximum, 1-100)
//! rotation = 0                          # Clockwise degrees: 0, 90, 180, 270
//! only_scale_down = true                # Leave small images at their size
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "resizer.toml";

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

/// Resizer configuration loaded from `resizer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Where staged copies and the final JPEG are written.
    pub storage: StorageConfig,
    /// Request values used when the caller leaves them out.
    pub defaults: RequestDefaults,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.storage.output_name;
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "storage.output_name must not be empty".into(),
            ));
        }
        if has_separator(name) {
            return Err(ConfigError::Validation(
                "storage.output_name must be a bare file name".into(),
            ));
        }
        let suffix = &self.storage.copy_suffix;
        if suffix.is_empty() {
            return Err(ConfigError::Validation(
                "storage.copy_suffix must not be empty".into(),
            ));
        }
        if has_separator(suffix) {
            return Err(ConfigError::Validation(
                "storage.copy_suffix must not contain path separators".into(),
            ));
        }
        if self.defaults.max_side == 0 {
            return Err(ConfigError::Validation(
                "defaults.max_side must be greater than 0".into(),
            ));
        }
        if self.defaults.quality > 100 {
            return Err(ConfigError::Validation(
                "defaults.quality must be 0-100".into(),
            ));
        }
        Ok(())
    }
}

fn has_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}

/// File locations used by a resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Scratch folder. When absent, the OS temp directory is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// File name of the final JPEG inside the scratch folder.
    pub output_name: String,
    /// Suffix inserted between the source stem and extension for the staged copy.
    pub copy_suffix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            output_name: "tempResizedImage.jpg".to_string(),
            copy_suffix: "ResizerCopy".to_string(),
        }
    }
}

impl StorageConfig {
    /// The effective scratch folder.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Full path of the final JPEG.
    pub fn output_path(&self) -> PathBuf {
        self.temp_dir().join(&self.output_name)
    }
}

/// Request parameters applied when the caller does not give them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestDefaults {
    pub max_side: u32,
    pub quality: u32,
    pub rotation: i32,
    pub only_scale_down: bool,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_side: 1920,
            quality: 80,
            rotation: 0,
            only_scale_down: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizerConfig::default())?)
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
) -> Result<ResizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `resizer.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Resizer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Scratch folder for the staged copy and the result.
# Defaults to the operating system's temp directory.
# temp_dir = "/tmp/resizer"

# File name of the resized JPEG. Every resize overwrites it.
output_name = "tempResizedImage.jpg"

# The source is copied to <stem><copy_suffix>.<ext> before processing.
copy_suffix = "ResizerCopy"

# ---------------------------------------------------------------------------
# Request defaults (used when the command line leaves a value out)
# ---------------------------------------------------------------------------
[defaults]
# Longer side of the result, in pixels. Must be greater than 0.
max_side = 1920

# JPEG quality 1-100. 0 means maximum quality.
quality = 80

# Clockwise rotation applied after scaling: 0, 90, 180 or 270.
# Any other value leaves the image unrotated.
rotation = 0

# When true, images already smaller than max_side keep their size.
only_scale_down = true
"##
}
