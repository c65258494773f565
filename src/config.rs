//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    APP_NAME, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DEFAULT_MAX_LABEL_LEN,
    DEFAULT_MAX_LEGEND_COLORS,
};
use crate::map::LegendIndex;
use crate::models::RgbColor;

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "COUNTYMAP_CONFIG_DIR";

/// Raster image format for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG with transparency
    #[default]
    Png,
    /// JPEG
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            other => anyhow::bail!("Unsupported image format '{other}' (expected png or jpeg)"),
        }
    }
}

/// Legend limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendConfig {
    /// Maximum number of distinct colors on the map
    #[serde(default = "default_max_colors")]
    pub max_colors: usize,
    /// Maximum label length in characters
    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,
}

fn default_max_colors() -> usize {
    DEFAULT_MAX_LEGEND_COLORS
}

fn default_max_label_len() -> usize {
    DEFAULT_MAX_LABEL_LEN
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            max_colors: default_max_colors(),
            max_label_len: default_max_label_len(),
        }
    }
}

impl LegendConfig {
    /// Empty legend index with these limits.
    #[must_use]
    pub const fn to_index(&self) -> LegendIndex {
        LegendIndex::new(self.max_colors, self.max_label_len)
    }
}

/// Image export defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Image format
    #[serde(default)]
    pub format: ImageFormat,
    /// Resolution multiplier
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Base map width in pixels at scale 1
    #[serde(default = "default_base_width")]
    pub base_width: u32,
    /// Base map height in pixels at scale 1
    #[serde(default = "default_base_height")]
    pub base_height: u32,
    /// Draw the legend next to the map
    #[serde(default = "default_show_legend")]
    pub show_legend: bool,
    /// Background color
    #[serde(default)]
    pub background: RgbColor,
    /// Directory for generated files (current directory if unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_scale() -> f64 {
    2.0
}

fn default_base_width() -> u32 {
    DEFAULT_MAP_WIDTH
}

fn default_base_height() -> u32 {
    DEFAULT_MAP_HEIGHT
}

fn default_show_legend() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            scale: default_scale(),
            base_width: default_base_width(),
            base_height: default_base_height(),
            show_legend: default_show_legend(),
            background: RgbColor::default(),
            output_dir: None,
        }
    }
}

/// Knowledge base settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Wikidata action API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Label and search language
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_endpoint() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            language: default_language(),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/CountyMap/config.toml`
/// - macOS: `~/Library/Application Support/CountyMap/config.toml`
/// - Windows: `%APPDATA%\CountyMap\config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Legend limits
    #[serde(default)]
    pub legend: LegendConfig,
    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,
    /// Knowledge base settings
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// `COUNTYMAP_CONFIG_DIR` overrides the platform location.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        let content = self.to_toml()?;
        let temp_path = path.with_extension("toml.tmp");

        fs::write(&temp_path, content).with_context(|| {
            format!("Failed to write temp config file: {}", temp_path.display())
        })?;

        fs::rename(&temp_path, path).with_context(|| {
            format!("Failed to rename temp config file to: {}", path.display())
        })?;

        Ok(())
    }

    /// Serializes to pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - legend limits are at least 1
    /// - `scale` is a finite positive number no larger than 10
    /// - base map dimensions are non-zero
    /// - the metadata endpoint is an http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.legend.max_colors == 0 {
            anyhow::bail!("legend.max_colors must be at least 1");
        }
        if self.legend.max_label_len == 0 {
            anyhow::bail!("legend.max_label_len must be at least 1");
        }

        let scale = self.export.scale;
        if !scale.is_finite() || scale <= 0.0 || scale > 10.0 {
            anyhow::bail!("export.scale must be between 0 and 10 (got {scale})");
        }
        if self.export.base_width == 0 || self.export.base_height == 0 {
            anyhow::bail!(
                "export base size must be non-zero (got {}x{})",
                self.export.base_width,
                self.export.base_height
            );
        }

        if !self.metadata.endpoint.starts_with("http://")
            && !self.metadata.endpoint.starts_with("https://")
        {
            anyhow::bail!(
                "metadata.endpoint must be an http(s) URL: {}",
                self.metadata.endpoint
            );
        }

        Ok(())
    }
}
