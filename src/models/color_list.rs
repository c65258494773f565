//! Ordered color stack assigned to a single region.

use crate::models::RgbColor;
use serde::{Deserialize, Serialize};

/// Maximum number of colors a region can carry at once.
pub const MAX_REGION_COLORS: usize = 2;

/// The colors assigned to one region, top first.
///
/// A list holds zero, one or two distinct colors. Index 0 is the "top" color
/// and index 1 the "bottom" color of a split rendering. An empty list means
/// the region is unselected and drawn with the default fill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<RgbColor>", into = "Vec<RgbColor>")]
pub struct ColorList(Vec<RgbColor>);

impl ColorList {
    /// Creates an empty (unselected) list.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Creates a single-color list.
    #[must_use]
    pub fn single(color: RgbColor) -> Self {
        Self(vec![color])
    }

    /// Creates a two-color split. Collapses to a single color when both match.
    #[must_use]
    pub fn split(top: RgbColor, bottom: RgbColor) -> Self {
        if top == bottom {
            Self::single(top)
        } else {
            Self(vec![top, bottom])
        }
    }

    /// Builds a list from arbitrary colors, rejecting duplicates and overflow.
    pub fn from_colors(colors: &[RgbColor]) -> anyhow::Result<Self> {
        if colors.len() > MAX_REGION_COLORS {
            anyhow::bail!(
                "A region holds at most {MAX_REGION_COLORS} colors (got {})",
                colors.len()
            );
        }
        if colors.len() == MAX_REGION_COLORS && colors[0] == colors[1] {
            anyhow::bail!("Color {} cannot be applied twice to one region", colors[0]);
        }
        Ok(Self(colors.to_vec()))
    }

    /// Top color, if any.
    #[must_use]
    pub fn top(&self) -> Option<RgbColor> {
        self.0.first().copied()
    }

    /// Bottom color of a split, if any.
    #[must_use]
    pub fn bottom(&self) -> Option<RgbColor> {
        self.0.get(1).copied()
    }

    /// Number of colors (0, 1 or 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an unselected region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `color` is part of the stack.
    #[must_use]
    pub fn contains(&self, color: RgbColor) -> bool {
        self.0.contains(&color)
    }

    /// Colors in top-to-bottom order.
    pub fn iter(&self) -> impl Iterator<Item = RgbColor> + '_ {
        self.0.iter().copied()
    }

    /// Colors as a slice, top first.
    #[must_use]
    pub fn as_slice(&self) -> &[RgbColor] {
        &self.0
    }

    /// Drops the bottom color, keeping only the top one.
    #[must_use]
    pub fn truncated_to_top(&self) -> Self {
        self.top().map_or_else(Self::empty, Self::single)
    }

    /// Hex strings of the colors, top first.
    #[must_use]
    pub fn to_hex_vec(&self) -> Vec<String> {
        self.0.iter().map(RgbColor::to_hex).collect()
    }
}

impl TryFrom<Vec<RgbColor>> for ColorList {
    type Error = anyhow::Error;

    fn try_from(colors: Vec<RgbColor>) -> anyhow::Result<Self> {
        Self::from_colors(&colors)
    }
}

impl From<ColorList> for Vec<RgbColor> {
    fn from(list: ColorList) -> Self {
        list.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: RgbColor = RgbColor::new(255, 0, 0);
    const GREEN: RgbColor = RgbColor::new(0, 255, 0);
    const BLUE: RgbColor = RgbColor::new(0, 0, 255);

    #[test]
    fn test_split_keeps_order() {
        let list = ColorList::split(RED, GREEN);
        assert_eq!(list.top(), Some(RED));
        assert_eq!(list.bottom(), Some(GREEN));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_split_same_color_collapses() {
        assert_eq!(ColorList::split(RED, RED), ColorList::single(RED));
    }

    #[test]
    fn test_from_colors_rejects_overflow_and_duplicates() {
        assert!(ColorList::from_colors(&[RED, GREEN, BLUE]).is_err());
        assert!(ColorList::from_colors(&[RED, RED]).is_err());
        assert!(ColorList::from_colors(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_to_top() {
        assert_eq!(
            ColorList::split(BLUE, RED).truncated_to_top(),
            ColorList::single(BLUE)
        );
        assert!(ColorList::empty().truncated_to_top().is_empty());
    }

    #[test]
    fn test_deserialize_from_mixed_notation() {
        let list: ColorList = serde_json::from_str(r##"["#ff0000", "rgb(0, 255, 0)"]"##).unwrap();
        assert_eq!(list, ColorList::split(RED, GREEN));
        assert!(serde_json::from_str::<ColorList>(r##"["#f00", "#ff0000"]"##).is_err());
    }
}
