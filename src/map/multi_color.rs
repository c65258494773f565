//! Color stacking rules for single- and multi-color selection.

use crate::models::{ColorList, RgbColor};

/// Result of applying a requested color to a region's current stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stack stays as it is
    Unchanged,
    /// The stack becomes the given list (possibly empty)
    Assign(ColorList),
}

impl Outcome {
    /// Resolves the outcome against the stack it was computed from.
    #[must_use]
    pub fn resolve(self, current: &ColorList) -> ColorList {
        match self {
            Self::Unchanged => current.clone(),
            Self::Assign(list) => list,
        }
    }
}

/// Computes the new color stack for a region.
///
/// Single-color mode toggles: requesting the region's only color clears it,
/// any other request overwrites the stack with that color.
///
/// Multi-color mode behaves as a two-slot stack:
/// - empty → `[requested]`
/// - requested already present → unchanged
/// - `[a]` → `[a, requested]`
/// - `[a, b]` → `[requested, a]` (`b` is evicted)
#[must_use]
pub fn apply(current: &ColorList, requested: RgbColor, multi_color: bool) -> Outcome {
    if !multi_color {
        if current.len() == 1 && current.top() == Some(requested) {
            return Outcome::Assign(ColorList::empty());
        }
        return Outcome::Assign(ColorList::single(requested));
    }

    if current.contains(requested) {
        return Outcome::Unchanged;
    }

    match (current.top(), current.bottom()) {
        (None, _) => Outcome::Assign(ColorList::single(requested)),
        (Some(top), None) => Outcome::Assign(ColorList::split(top, requested)),
        (Some(top), Some(_evicted)) => Outcome::Assign(ColorList::split(requested, top)),
    }
}
