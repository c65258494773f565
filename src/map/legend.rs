//! Legend ("map key") index: color → label → member regions.
//!
//! The legend is derived from the selection store. Every color present on
//! the map owns one entry; an entry disappears when its last member region
//! loses that color, which frees the slot for another color.

#![allow(clippy::cast_precision_loss)]

use crate::constants::{
    DEFAULT_MAX_LABEL_LEN, DEFAULT_MAX_LEGEND_COLORS, LEGEND_CHAR_WIDTH, LEGEND_PADDING,
    LEGEND_ROW_HEIGHT, LEGEND_SWATCH_GAP, LEGEND_SWATCH_SIZE, LEGEND_TITLE, LEGEND_TITLE_HEIGHT,
};
use crate::models::RgbColor;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Raised when a new color would push the legend past its color limit.
///
/// This is a user-facing warning, not a failure: the triggering action is
/// simply not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Map key is limited to {limit} colors; {color} was not added")]
pub struct LegendFull {
    /// The rejected color
    pub color: RgbColor,
    /// Configured maximum number of distinct colors
    pub limit: usize,
}

/// One color of the legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    /// Color key
    pub color: RgbColor,
    /// User label; `None` means the positional default is shown
    pub label: Option<String>,
    /// Ids of regions currently carrying this color
    pub members: BTreeSet<String>,
}

impl LegendEntry {
    fn new(color: RgbColor) -> Self {
        Self {
            color,
            label: None,
            members: BTreeSet::new(),
        }
    }

    /// Label shown for this entry at a 0-based display position.
    #[must_use]
    pub fn display_label(&self, position: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| default_label(position))
    }
}

/// Default label for the entry at a 0-based display position.
#[must_use]
pub fn default_label(position: usize) -> String {
    format!("Label {}", position + 1)
}

/// A rendered legend row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendRow {
    /// Hex color
    pub color: String,
    /// Effective label
    pub label: String,
    /// Member region ids
    pub members: Vec<String>,
}

/// Color → label → members index with a distinct-color cap.
///
/// Entries keep their insertion order, which is also their display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendIndex {
    entries: Vec<LegendEntry>,
    max_colors: usize,
    max_label_len: usize,
}

impl Default for LegendIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEGEND_COLORS, DEFAULT_MAX_LABEL_LEN)
    }
}

impl LegendIndex {
    /// Creates an empty legend with the given limits.
    #[must_use]
    pub const fn new(max_colors: usize, max_label_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_colors,
            max_label_len,
        }
    }

    /// Maximum number of distinct colors.
    #[must_use]
    pub const fn max_colors(&self) -> usize {
        self.max_colors
    }

    /// Number of distinct colors currently listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no color is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the color has an entry.
    #[must_use]
    pub fn contains(&self, color: RgbColor) -> bool {
        self.position(color).is_some()
    }

    fn position(&self, color: RgbColor) -> Option<usize> {
        self.entries.iter().position(|e| e.color == color)
    }

    /// Entry for a color, if listed.
    #[must_use]
    pub fn entry(&self, color: RgbColor) -> Option<&LegendEntry> {
        self.entries.iter().find(|e| e.color == color)
    }

    /// Entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = &LegendEntry> {
        self.entries.iter()
    }

    /// Effective label of a color, including the positional default.
    #[must_use]
    pub fn label(&self, color: RgbColor) -> Option<String> {
        self.position(color)
            .map(|idx| self.entries[idx].display_label(idx))
    }

    /// Returns true if adding `color` right now would exceed the limit.
    #[must_use]
    pub fn is_full_for(&self, color: RgbColor) -> bool {
        !self.contains(color) && self.entries.len() >= self.max_colors
    }

    /// Adds a region to a color's member set, creating the entry if needed.
    ///
    /// A new color is refused when the legend already holds `max_colors`
    /// colors; nothing changes in that case.
    pub fn upsert(&mut self, region_id: &str, color: RgbColor) -> Result<(), LegendFull> {
        let idx = match self.position(color) {
            Some(idx) => idx,
            None => {
                if self.entries.len() >= self.max_colors {
                    return Err(LegendFull {
                        color,
                        limit: self.max_colors,
                    });
                }
                self.entries.push(LegendEntry::new(color));
                self.entries.len() - 1
            }
        };

        self.entries[idx].members.insert(region_id.to_string());
        Ok(())
    }

    /// Removes a region from a color's member set.
    ///
    /// Returns true when the entry became empty and was deleted.
    pub fn remove(&mut self, region_id: &str, color: RgbColor) -> bool {
        let Some(idx) = self.position(color) else {
            return false;
        };

        self.entries[idx].members.remove(region_id);
        if self.entries[idx].members.is_empty() {
            self.entries.remove(idx);
            return true;
        }
        false
    }

    /// Sets a color's label, truncated to the configured maximum length.
    ///
    /// A blank label restores the positional default. Returns the effective
    /// label, or `None` when the color is not listed.
    pub fn relabel(&mut self, color: RgbColor, label: &str) -> Option<String> {
        let idx = self.position(color)?;
        let trimmed = label.trim();

        self.entries[idx].label = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.chars().take(self.max_label_len).collect())
        };

        Some(self.entries[idx].display_label(idx))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rows in display order with effective labels.
    #[must_use]
    pub fn rows(&self) -> Vec<LegendRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| LegendRow {
                color: entry.color.to_hex(),
                label: entry.display_label(idx),
                members: entry.members.iter().cloned().collect(),
            })
            .collect()
    }

    /// Horizontal space needed to render the legend at `scale`.
    ///
    /// Width is the widest label (defaults included, title as a lower
    /// bound) plus swatch, gap and padding, all scaled linearly. An empty
    /// legend needs no space.
    #[must_use]
    pub fn measure(&self, scale: f64) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }

        let widest = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| entry.display_label(idx).chars().count())
            .max()
            .unwrap_or(0)
            .max(LEGEND_TITLE.chars().count());

        (2.0 * LEGEND_PADDING
            + LEGEND_SWATCH_SIZE
            + LEGEND_SWATCH_GAP
            + widest as f64 * LEGEND_CHAR_WIDTH)
            * scale
    }

    /// Vertical space needed to render the legend at `scale`.
    #[must_use]
    pub fn measure_height(&self, scale: f64) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }

        (2.0 * LEGEND_PADDING + LEGEND_TITLE_HEIGHT + self.entries.len() as f64 * LEGEND_ROW_HEIGHT)
            * scale
    }
}
