//! Immutable set of regions plus the state name mapping.

use crate::constants;
use crate::models::{Region, RegionKind};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// All regions known to the map, loaded once at startup.
///
/// The catalog is read-only after construction and is shared between the
/// selection store, the session and the exporters behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoCatalog {
    regions: BTreeMap<String, Region>,
    state_names: BTreeMap<String, String>,
}

impl GeoCatalog {
    /// Builds a catalog from regions and a FIPS → state name mapping.
    ///
    /// Later regions with a duplicate id replace earlier ones.
    pub fn new(regions: Vec<Region>, state_names: BTreeMap<String, String>) -> Self {
        let regions = regions
            .into_iter()
            .map(|region| (region.id.clone(), region))
            .collect();
        Self {
            regions,
            state_names,
        }
    }

    /// Looks up a region by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Returns true if the id belongs to a known region.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    /// All regions in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Regions of one kind in id order.
    pub fn regions_of_kind(&self, kind: RegionKind) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(move |r| r.kind == kind)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true when no regions were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Resolves a state name from a FIPS code, falling back to the built-in table.
    #[must_use]
    pub fn state_name(&self, fips: &str) -> Option<&str> {
        self.state_names
            .get(fips)
            .map(String::as_str)
            .or_else(|| constants::state_name_for_fips(fips))
    }

    /// The FIPS → state name mapping read from the catalog source.
    #[must_use]
    pub const fn state_names(&self) -> &BTreeMap<String, String> {
        &self.state_names
    }

    /// Expands a region group into the ids of its member regions.
    ///
    /// A group is a US Census region ("South"), a Census division ("Pacific")
    /// or a single state name ("Texas"). A state group contains the state
    /// itself and all of its counties. Unknown names expand to an empty set.
    #[must_use]
    pub fn group_members(&self, group: &str) -> BTreeSet<String> {
        let states: Vec<&str> = match constants::census_group_states(group) {
            Some(states) => states,
            None => vec![group],
        };

        let members: BTreeSet<String> = self
            .regions
            .values()
            .filter(|region| {
                region
                    .state_name()
                    .is_some_and(|state| states.iter().any(|s| s.eq_ignore_ascii_case(state)))
            })
            .map(|region| region.id.clone())
            .collect();

        if members.is_empty() {
            debug!("Region group '{group}' matched no regions");
        }

        members
    }

    /// Names of every group that can be used for isolation: Census regions,
    /// Census divisions, then the states present in the catalog.
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, region, _) in constants::CENSUS_DIVISIONS {
            if !names.iter().any(|n| n == region) {
                names.push((*region).to_string());
            }
        }
        names.extend(
            constants::CENSUS_DIVISIONS
                .iter()
                .map(|(division, _, _)| (*division).to_string()),
        );

        let states: BTreeSet<&str> = self.regions.values().filter_map(Region::state_name).collect();
        names.extend(states.into_iter().map(str::to_string));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> GeoCatalog {
        let texas = Some("Texas".to_string());
        GeoCatalog::new(
            vec![
                Region::new("48", "Texas", None, RegionKind::State),
                Region::new("40", "Oklahoma", None, RegionKind::State),
                Region::new("06", "California", None, RegionKind::State),
                Region::new("48453", "Travis", texas.clone(), RegionKind::County),
                Region::new("48201", "Harris", texas, RegionKind::County),
                Region::new("06037", "Los Angeles", Some("California".into()), RegionKind::County),
            ],
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_state_group_includes_counties() {
        let members = catalog().group_members("Texas");
        let expected: BTreeSet<String> =
            ["48", "48201", "48453"].iter().map(|s| s.to_string()).collect();
        assert_eq!(members, expected);
    }

    #[test]
    fn test_census_region_group() {
        let members = catalog().group_members("West South Central");
        assert!(members.contains("40"));
        assert!(members.contains("48453"));
        assert!(!members.contains("06"));
    }

    #[test]
    fn test_unknown_group_is_empty() {
        assert!(catalog().group_members("Narnia").is_empty());
    }

    #[test]
    fn test_state_name_fallback() {
        let catalog = catalog();
        assert_eq!(catalog.state_name("48"), Some("Texas"));
        assert_eq!(catalog.state_name("99"), None);
    }

    #[test]
    fn test_group_names_lists_regions_then_divisions_then_states() {
        let names = catalog().group_names();
        assert_eq!(&names[..4], &["Northeast", "Midwest", "South", "West"]);
        assert!(names.contains(&"Pacific".to_string()));
        assert!(names.contains(&"Texas".to_string()));
    }

    #[test]
    fn test_regions_of_kind() {
        assert_eq!(catalog().regions_of_kind(RegionKind::County).count(), 3);
    }
}
