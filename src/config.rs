//! Processor configuration.
//!
//! Settings that apply to every render a [`Processor`](crate::process::Processor)
//! performs, as opposed to per-render [recipes](crate::recipe).
//!
//! ## Config File
//!
//! The CLI reads `imagesmith.toml` from the working directory, or the file
//! passed with `--config`:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! quality = 75              # Encoder quality for lossy formats (1-100)
//! content_digest = false    # Hash source bytes into the cache signature
//! default_font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
//! # temp_dir = "/var/tmp/imagesmith"  # Staging directory for atomic writes
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = "imagesmith.toml";

const DEFAULT_QUALITY: u32 = 75;
const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Processor-wide settings.
///
/// All fields have defaults; a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Where artifacts are staged before the atomic rename. Created when the
    /// processor starts. `None` stages next to the artifact.
    pub temp_dir: Option<PathBuf>,
    /// Encoder quality, 1-100. Part of every render signature.
    pub quality: u32,
    /// Include a SHA-256 of the source bytes in the signature, so a source
    /// rewritten within the same second still misses the cache.
    pub content_digest: bool,
    /// Font for text overlays that name none, or whose font is unreadable.
    pub default_font: Option<PathBuf>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            quality: DEFAULT_QUALITY,
            content_digest: false,
            default_font: Some(PathBuf::from(DEFAULT_FONT)),
        }
    }
}

impl ProcessorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self
            .temp_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Validation(
                "temp_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ProcessorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    ProcessorConfig::from_toml(&content)
}

/// Load `imagesmith.toml` from `dir` if present, defaults otherwise.
/// A present but invalid file is still an error.
pub fn discover_config(dir: &Path) -> Result<ProcessorConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return Ok(ProcessorConfig::default());
    }
    load_config(&path)
}

/// Returns a fully-commented stock `imagesmith.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imagesmith configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Encoder quality for lossy formats (1 = worst, 100 = best).
# JPEG and AVIF honor it; WebP output is lossless. Changing it changes
# every render signature, so all artifacts are rendered again.
quality = 75

# Also hash the source file's bytes into the render signature.
# Off: a source rewritten within the same second as its previous version
# may still be served from cache. On: every request reads the source.
content_digest = false

# Font used by text overlays that name none (or whose font cannot be read).
default_font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"

# Staging directory for atomic writes. Artifacts are encoded here and then
# renamed into place. Defaults to the output directory itself.
# temp_dir = "/var/tmp/imagesmith"
"##
}
