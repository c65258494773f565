//! Geographic regions (counties and states) loaded from the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ring of `[longitude, latitude]` positions. The first ring of a polygon is
/// its outer boundary, later rings are holes.
pub type Ring = Vec<[f64; 2]>;

/// A polygon as a list of rings.
pub type Polygon = Vec<Ring>;

/// Administrative level of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// A county (or county equivalent) inside a state
    County,
    /// A state, district or territory
    State,
}

impl RegionKind {
    /// Word used when searching external knowledge bases ("County", "state").
    #[must_use]
    pub const fn search_term(self) -> &'static str {
        match self {
            Self::County => "County",
            Self::State => "state",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::County => write!(f, "county"),
            Self::State => write!(f, "state"),
        }
    }
}

/// One geographic feature of the catalog.
///
/// Regions are created once when the catalog loads and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier (FIPS code or feature id)
    pub id: String,
    /// Display name (e.g., "Travis" or "Texas")
    pub name: String,
    /// Name of the containing state, for counties
    pub parent: Option<String>,
    /// County or state
    pub kind: RegionKind,
    /// Boundary polygons in longitude/latitude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<Polygon>,
}

impl Region {
    /// Creates a region without geometry.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<String>,
        kind: RegionKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent,
            kind,
            geometry: Vec::new(),
        }
    }

    /// Attaches boundary polygons.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Vec<Polygon>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Name of the state this region belongs to (itself for states).
    #[must_use]
    pub fn state_name(&self) -> Option<&str> {
        match self.kind {
            RegionKind::State => Some(&self.name),
            RegionKind::County => self.parent.as_deref(),
        }
    }

    /// Human-readable name including the parent state for counties.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.parent) {
            (RegionKind::County, Some(parent)) => format!("{}, {}", self.name, parent),
            _ => self.name.clone(),
        }
    }

    /// Bounding box `[min_lon, min_lat, max_lon, max_lat]`, if the region has geometry.
    #[must_use]
    pub fn bounds(&self) -> Option<[f64; 4]> {
        let mut points = self.geometry.iter().flatten().flatten();
        let first = points.next()?;
        let init = [first[0], first[1], first[0], first[1]];
        Some(points.fold(init, |[x0, y0, x1, y1], p| {
            [x0.min(p[0]), y0.min(p[1]), x1.max(p[0]), y1.max(p[1])]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        vec![vec![[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
    }

    #[test]
    fn test_display_name_for_county() {
        let county = Region::new("48453", "Travis", Some("Texas".to_string()), RegionKind::County);
        assert_eq!(county.display_name(), "Travis, Texas");
        assert_eq!(county.state_name(), Some("Texas"));
    }

    #[test]
    fn test_state_is_its_own_state() {
        let state = Region::new("48", "Texas", None, RegionKind::State);
        assert_eq!(state.display_name(), "Texas");
        assert_eq!(state.state_name(), Some("Texas"));
    }

    #[test]
    fn test_bounds() {
        let region = Region::new("1", "Box", None, RegionKind::State).with_geometry(vec![square()]);
        assert_eq!(region.bounds(), Some([0.0, 0.0, 2.0, 1.0]));
        assert_eq!(Region::new("2", "Empty", None, RegionKind::State).bounds(), None);
    }
}
