//! Isolation: restricting the map to a visible subset of regions.
//!
//! The filter only tracks visibility. Purging colors of regions that leave
//! the visible set is done by the selection store, which owns the colors.

use crate::models::GeoCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How the isolated subset is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Named region groups (Census regions, divisions, states)
    Region,
    /// An explicit list of region ids
    Custom,
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region => write!(f, "region"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Current isolation state and its sub-mode selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IsolationState {
    /// Every region is visible
    #[default]
    Inactive,
    /// Visibility is the union of the selected groups
    RegionMode {
        /// Selected group names
        groups: BTreeSet<String>,
    },
    /// Visibility is an explicit list of regions
    CustomMode {
        /// Selected region ids
        regions: BTreeSet<String>,
    },
}

/// Tracks which regions are visible while isolation is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsolationFilter {
    state: IsolationState,
    visible: BTreeSet<String>,
}

impl IsolationFilter {
    /// Creates an inactive filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while isolation is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, IsolationState::Inactive)
    }

    /// Active sub-mode, if any.
    #[must_use]
    pub const fn mode(&self) -> Option<IsolationMode> {
        match self.state {
            IsolationState::Inactive => None,
            IsolationState::RegionMode { .. } => Some(IsolationMode::Region),
            IsolationState::CustomMode { .. } => Some(IsolationMode::Custom),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &IsolationState {
        &self.state
    }

    /// Visible region ids (empty while inactive).
    #[must_use]
    pub const fn visible(&self) -> &BTreeSet<String> {
        &self.visible
    }

    /// Selected groups (region mode) or region ids (custom mode).
    #[must_use]
    pub fn selected(&self) -> BTreeSet<String> {
        match &self.state {
            IsolationState::Inactive => BTreeSet::new(),
            IsolationState::RegionMode { groups } => groups.clone(),
            IsolationState::CustomMode { regions } => regions.clone(),
        }
    }

    /// Returns true if the region may be shown and colored.
    #[must_use]
    pub fn is_visible(&self, region_id: &str) -> bool {
        !self.is_active() || self.visible.contains(region_id)
    }

    /// Enters isolation with an explicit sub-mode selection and visible set.
    ///
    /// Entering again while active replaces the previous selection.
    pub fn enter(
        &mut self,
        mode: IsolationMode,
        selection: BTreeSet<String>,
        visible: BTreeSet<String>,
    ) {
        self.state = match mode {
            IsolationMode::Region => IsolationState::RegionMode { groups: selection },
            IsolationMode::Custom => IsolationState::CustomMode { regions: selection },
        };
        self.visible = visible;
    }

    /// Enters region mode showing the members of `groups`.
    pub fn enter_groups(&mut self, groups: BTreeSet<String>, catalog: &GeoCatalog) {
        let visible = expand_groups(&groups, catalog);
        self.enter(IsolationMode::Region, groups, visible);
    }

    /// Enters custom mode showing exactly the known ids in `regions`.
    pub fn enter_custom(&mut self, regions: BTreeSet<String>, catalog: &GeoCatalog) {
        let regions: BTreeSet<String> = regions
            .into_iter()
            .filter(|id| catalog.contains(id))
            .collect();
        let visible = regions.clone();
        self.enter(IsolationMode::Custom, regions, visible);
    }

    /// Switches between region and custom mode without touching visibility.
    ///
    /// Custom mode starts from the visible ids; region mode starts from the
    /// groups whose members are all visible. Returns false while inactive or
    /// when already in `mode`.
    pub fn switch_mode(&mut self, mode: IsolationMode, catalog: &GeoCatalog) -> bool {
        match self.mode() {
            Some(current) if current != mode => {}
            _ => return false,
        }

        self.state = match mode {
            IsolationMode::Custom => IsolationState::CustomMode {
                regions: self.visible.clone(),
            },
            IsolationMode::Region => IsolationState::RegionMode {
                groups: catalog
                    .group_names()
                    .into_iter()
                    .filter(|group| {
                        let members = catalog.group_members(group);
                        !members.is_empty() && members.is_subset(&self.visible)
                    })
                    .collect(),
            },
        };
        true
    }

    /// Adds or removes a group while in region mode and recomputes visibility.
    ///
    /// Returns false (and changes nothing) outside region mode.
    pub fn toggle_group(&mut self, group: &str, catalog: &GeoCatalog) -> bool {
        let IsolationState::RegionMode { groups } = &mut self.state else {
            return false;
        };

        if !groups.remove(group) {
            groups.insert(group.to_string());
        }
        self.visible = expand_groups(groups, catalog);
        true
    }

    /// Adds or removes a region while in custom mode and recomputes visibility.
    ///
    /// Returns false (and changes nothing) outside custom mode or for ids the
    /// catalog does not know.
    pub fn toggle_region(&mut self, region_id: &str, catalog: &GeoCatalog) -> bool {
        let IsolationState::CustomMode { regions } = &mut self.state else {
            return false;
        };
        if !catalog.contains(region_id) {
            return false;
        }

        if !regions.remove(region_id) {
            regions.insert(region_id.to_string());
        }
        self.visible = regions.clone();
        true
    }

    /// Leaves isolation, clearing visibility and every selection.
    pub fn exit(&mut self) {
        self.state = IsolationState::Inactive;
        self.visible.clear();
    }
}

fn expand_groups(groups: &BTreeSet<String>, catalog: &GeoCatalog) -> BTreeSet<String> {
    groups
        .iter()
        .flat_map(|group| catalog.group_members(group))
        .collect()
}
