//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file is read
//! from a single directory (`--config-dir`, default the working directory)
//! and merged key-by-key over the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [combination]
//! enabled = true            # Merge 2+ photos into composites of up to four
//! spacing = 10              # White gap between images, in pixels
//! max_width = 1920          # Composite canvas bound
//! max_height = 1080
//!
//! [optimization]
//! enabled = true            # Fit every output under a byte budget
//! max_file_size_kb = 500    # 50-5000
//! max_width = 1920          # 200-4000
//! max_height = 1080         # 200-4000
//! quality = 80              # Starting JPEG quality, 10-100
//!
//! [output]
//! prefix = "product"        # Written as product-001.jpg, product-002.jpg, ...
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, so override just the values you want:
//!
//! ```toml
//! [optimization]
//! max_file_size_kb = 200
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CombinationSettings, MAX_QUALITY, MIN_QUALITY, OptimizationSettings, Quality};
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

/// Accepted range for `optimization.max_file_size_kb`.
pub const FILE_SIZE_KB_RANGE: (u32, u32) = (50, 5000);

/// Accepted range for `optimization.max_width` / `max_height`.
pub const OPTIMIZATION_DIMENSION_RANGE: (u32, u32) = (200, 4000);

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Composite generation.
    pub combination: CombinationConfig,
    /// Byte-budget optimization.
    pub optimization: OptimizationConfig,
    /// Output file naming.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl CatalogConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.combination;
        if c.max_width == 0 || c.max_height == 0 {
            return Err(ConfigError::Validation(
                "combination.max_width and max_height must be at least 1".into(),
            ));
        }

        let o = &self.optimization;
        let (lo, hi) = FILE_SIZE_KB_RANGE;
        if !(lo..=hi).contains(&o.max_file_size_kb) {
            return Err(ConfigError::Validation(format!(
                "optimization.max_file_size_kb must be {lo}-{hi}"
            )));
        }
        let (lo, hi) = OPTIMIZATION_DIMENSION_RANGE;
        if !(lo..=hi).contains(&o.max_width) || !(lo..=hi).contains(&o.max_height) {
            return Err(ConfigError::Validation(format!(
                "optimization.max_width and max_height must be {lo}-{hi}"
            )));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&o.quality) {
            return Err(ConfigError::Validation(format!(
                "optimization.quality must be {MIN_QUALITY}-{MAX_QUALITY}"
            )));
        }

        let prefix = &self.output.prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.prefix must be a non-empty file name without separators".into(),
            ));
        }
        Ok(())
    }
}

/// Composite generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombinationConfig {
    /// When false, `publish` passes every source through individually.
    pub enabled: bool,
    /// White gap between images and grid cells, in pixels.
    pub spacing: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CombinationConfig {
    fn default() -> Self {
        let settings = CombinationSettings::default();
        Self {
            enabled: true,
            spacing: settings.spacing,
            max_width: settings.max_width,
            max_height: settings.max_height,
        }
    }
}

impl From<&CombinationConfig> for CombinationSettings {
    fn from(config: &CombinationConfig) -> Self {
        Self {
            spacing: config.spacing,
            max_width: config.max_width,
            max_height: config.max_height,
        }
    }
}

/// Byte-budget optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationConfig {
    /// When false, `publish` writes buffers as produced.
    pub enabled: bool,
    pub max_file_size_kb: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Starting JPEG quality for the search.
    pub quality: u32,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        let settings = OptimizationSettings::default();
        Self {
            enabled: true,
            max_file_size_kb: settings.max_file_size_kb,
            max_width: settings.max_width,
            max_height: settings.max_height,
            quality: settings.quality.value(),
        }
    }
}

impl From<&OptimizationConfig> for OptimizationSettings {
    fn from(config: &OptimizationConfig) -> Self {
        Self {
            max_file_size_kb: config.max_file_size_kb,
            max_width: config.max_width,
            max_height: config.max_height,
            quality: Quality::new(config.quality),
        }
    }
}

/// Output naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File name prefix; outputs are `{prefix}-001.jpg`, `{prefix}-002.jpg`, ...
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "product".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CatalogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<CatalogConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Catalog Imaging Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Composites
# ---------------------------------------------------------------------------
[combination]
# Merge two or more photos into composites of up to four images each.
# A single photo is never combined.
enabled = true

# White gap between images, in pixels.
spacing = 10

# Bounding box for each composite canvas.
max_width = 1920
max_height = 1080

# ---------------------------------------------------------------------------
# Byte-budget optimization
# ---------------------------------------------------------------------------
[optimization]
# Re-encode every output as JPEG so it fits under max_file_size_kb.
enabled = true

# Target size in kilobytes (50-5000).
max_file_size_kb = 500

# Larger images are scaled down to fit first (200-4000).
max_width = 1920
max_height = 1080

# Starting JPEG quality (10-100). Lowered in steps until the target fits.
quality = 80

# ---------------------------------------------------------------------------
# Output naming
# ---------------------------------------------------------------------------
[output]
# Files are written as <prefix>-001.jpg, <prefix>-002.jpg, ...
prefix = "product"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
