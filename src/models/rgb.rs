//! RGB color handling with hex and CSS `rgb()` parsing.
//!
//! Every color that reaches the selection store or the legend goes through
//! [`RgbColor::parse`], so `#ff0000`, `#F00` and `rgb(255, 0, 0)` all collapse
//! to the same key.

// Allow small types passed by reference for API consistency
#![allow(clippy::trivially_copy_pass_by_ref)]

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// RGB color value with hex string representation.
///
/// Represents a color using red, green, and blue channels (0-255 each).
/// Serializes as an uppercase `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

fn css_rgb_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[0-9.]+%?\s*)?\)$",
        )
        .unwrap_or_else(|e| unreachable!("static rgb() pattern is valid: {e}"))
    })
}

impl RgbColor {
    /// Creates a new `RgbColor` from individual channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses any supported color notation.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB`, `rgb(r, g, b)` and
    /// `rgba(r, g, b, a)` (alpha is ignored). Matching is case-insensitive and
    /// surrounding whitespace is trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use countymap::models::RgbColor;
    ///
    /// let a = RgbColor::parse("rgb(255, 0, 0)").unwrap();
    /// let b = RgbColor::parse("#f00").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.to_hex(), "#FF0000");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().to_ascii_lowercase();

        if trimmed.starts_with("rgb") {
            return Self::from_css_rgb(&trimmed);
        }

        Self::from_hex(&trimmed)
    }

    /// Parses an `RgbColor` from a hex string.
    ///
    /// Supports formats: "#RRGGBB", "RRGGBB", "#RGB", "RGB" in either case.
    ///
    /// # Examples
    ///
    /// ```
    /// use countymap::models::RgbColor;
    ///
    /// let color = RgbColor::from_hex("#FF0000").unwrap();
    /// assert_eq!(color, RgbColor::new(255, 0, 0));
    ///
    /// let color = RgbColor::from_hex("0f0").unwrap();
    /// assert_eq!(color, RgbColor::new(0, 255, 0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid hex color format.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid hex color format '{hex}'. Expected hex digits");
        }

        let expanded;
        let hex = match hex.len() {
            6 => hex,
            3 => {
                expanded = hex.chars().flat_map(|c| [c, c]).collect::<String>();
                expanded.as_str()
            }
            _ => anyhow::bail!(
                "Invalid hex color format '{hex}'. Expected 3 or 6 hex digits (RGB or RRGGBB)"
            ),
        };

        let r = u8::from_str_radix(&hex[0..2], 16)
            .context(format!("Invalid red channel in hex color '{hex}'"))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .context(format!("Invalid green channel in hex color '{hex}'"))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .context(format!("Invalid blue channel in hex color '{hex}'"))?;

        Ok(Self::new(r, g, b))
    }

    fn from_css_rgb(css: &str) -> Result<Self> {
        let caps = css_rgb_pattern()
            .captures(css)
            .with_context(|| format!("Invalid rgb() color '{css}'"))?;

        let channel = |idx: usize, name: &str| -> Result<u8> {
            caps[idx]
                .parse::<u8>()
                .with_context(|| format!("{name} channel out of range in '{css}'"))
        };

        Ok(Self::new(
            channel(1, "Red")?,
            channel(2, "Green")?,
            channel(3, "Blue")?,
        ))
    }

    /// Converts the color to a hex string in the format "#RRGGBB" (uppercase).
    ///
    /// # Examples
    ///
    /// ```
    /// use countymap::models::RgbColor;
    ///
    /// let color = RgbColor::new(0, 128, 255);
    /// assert_eq!(color.to_hex(), "#0080FF");
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Channels as an RGBA array with full opacity.
    #[must_use]
    pub const fn to_rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RgbColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        color.to_hex()
    }
}

impl Default for RgbColor {
    /// Default color is white (#FFFFFF).
    fn default() -> Self {
        Self::new(255, 255, 255)
    }
}
