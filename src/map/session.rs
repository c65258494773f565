//! Scripted map sessions: replaying user actions against a store.

use crate::map::isolation::IsolationMode;
use crate::map::legend::{LegendFull, LegendIndex};
use crate::map::store::{SelectionStore, SetColorOutcome};
use crate::models::{ColorList, GeoCatalog, RgbColor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Click a region with a color
    Color {
        /// Region id
        region: String,
        /// Requested color
        color: RgbColor,
    },
    /// Color every visible member of a group
    ColorGroup {
        /// Group name
        group: String,
        /// Requested color
        color: RgbColor,
    },
    /// Replace a region's colors directly
    SetColors {
        /// Region id
        region: String,
        /// New colors, top first
        colors: ColorList,
    },
    /// Reset one region to the default fill
    ClearRegion {
        /// Region id
        region: String,
    },
    /// Reset the whole map
    Clear,
    /// Rename a legend color
    Relabel {
        /// Legend color
        color: RgbColor,
        /// New label
        label: String,
    },
    /// Toggle multi-color mode
    SetMultiColor {
        /// New mode
        enabled: bool,
    },
    /// Enter region-mode isolation
    IsolateGroups {
        /// Group names
        groups: Vec<String>,
    },
    /// Enter custom-mode isolation
    IsolateCustom {
        /// Region ids
        regions: Vec<String>,
    },
    /// Toggle a group while isolated in region mode
    ToggleGroup {
        /// Group name
        group: String,
    },
    /// Toggle a region while isolated in custom mode
    ToggleRegion {
        /// Region id
        region: String,
    },
    /// Switch the isolation sub-mode
    SwitchIsolationMode {
        /// Target sub-mode
        mode: IsolationMode,
    },
    /// Leave isolation (discards all colors)
    ExitIsolation,
}

/// A sequence of actions with the initial selection mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionScript {
    /// Start in multi-color mode
    #[serde(default)]
    pub multi_color: bool,
    /// Actions in order
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// User-visible message produced while replaying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The legend color limit refused a color
    ColorLimit {
        /// Rejected color
        color: RgbColor,
        /// Configured limit
        limit: usize,
    },
    /// A region outside the isolated subset was clicked
    Hidden {
        /// Region id
        region: String,
    },
    /// A region id the catalog does not know
    UnknownRegion {
        /// Region id
        region: String,
    },
    /// A group name that matched no regions
    UnknownGroup {
        /// Group name
        group: String,
    },
    /// A label change for a color that is not on the map
    UnknownColor {
        /// Color
        color: RgbColor,
    },
    /// Colors discarded by an isolation change
    Purged {
        /// Cleared region ids
        regions: Vec<String>,
    },
}

impl From<LegendFull> for Notice {
    fn from(full: LegendFull) -> Self {
        Self::ColorLimit {
            color: full.color,
            limit: full.limit,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColorLimit { color, limit } => {
                write!(f, "Map key is limited to {limit} colors; {color} was not added")
            }
            Self::Hidden { region } => write!(f, "Region '{region}' is hidden by isolation"),
            Self::UnknownRegion { region } => write!(f, "Unknown region '{region}'"),
            Self::UnknownGroup { group } => write!(f, "Group '{group}' matches no regions"),
            Self::UnknownColor { color } => write!(f, "Color {color} is not on the map"),
            Self::Purged { regions } => {
                write!(f, "Isolation cleared {} colored region(s)", regions.len())
            }
        }
    }
}

/// A store plus the notices produced while driving it.
#[derive(Debug)]
pub struct MapSession {
    store: SelectionStore,
    notices: Vec<Notice>,
}

impl MapSession {
    /// Starts an empty session.
    #[must_use]
    pub fn new(catalog: Arc<GeoCatalog>, legend: LegendIndex) -> Self {
        Self {
            store: SelectionStore::with_legend(catalog, legend),
            notices: Vec::new(),
        }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Mutable access to the store, e.g. to subscribe observers.
    pub fn store_mut(&mut self) -> &mut SelectionStore {
        &mut self.store
    }

    /// Notices collected so far.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Replays a whole script.
    pub fn replay(&mut self, script: &ActionScript) {
        self.store.set_multi_color(script.multi_color);
        for action in &script.actions {
            self.apply(action);
        }
        info!(
            "Replayed {} actions: {} colored regions, {} legend colors",
            script.actions.len(),
            self.store.selections().count(),
            self.store.legend().len()
        );
    }

    /// Applies one action.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Color { region, color } => {
                let outcome = self.store.apply_color(region, *color);
                self.record(region, outcome);
            }
            Action::ColorGroup { group, color } => {
                let outcomes = self.store.apply_color_to_group(group, *color);
                if outcomes.is_empty() {
                    self.notices.push(Notice::UnknownGroup {
                        group: group.clone(),
                    });
                }
                for (region, outcome) in outcomes {
                    self.record(&region, outcome);
                }
            }
            Action::SetColors { region, colors } => {
                let outcome = self.store.set_color(region, colors.clone());
                self.record(region, outcome);
            }
            Action::ClearRegion { region } => {
                let outcome = self.store.set_color(region, ColorList::empty());
                self.record(region, outcome);
            }
            Action::Clear => self.store.clear_all(),
            Action::Relabel { color, label } => {
                if self.store.relabel(*color, label).is_none() {
                    self.notices.push(Notice::UnknownColor { color: *color });
                }
            }
            Action::SetMultiColor { enabled } => self.store.set_multi_color(*enabled),
            Action::IsolateGroups { groups } => {
                let purged = self.store.isolate_groups(groups.iter().cloned().collect());
                self.record_purge(purged);
            }
            Action::IsolateCustom { regions } => {
                let purged = self.store.isolate_custom(regions.iter().cloned().collect());
                self.record_purge(purged);
            }
            Action::ToggleGroup { group } => {
                let purged = self.store.toggle_isolation_group(group);
                self.record_purge(purged);
            }
            Action::ToggleRegion { region } => {
                let purged = self.store.toggle_isolation_region(region);
                self.record_purge(purged);
            }
            Action::SwitchIsolationMode { mode } => {
                self.store.switch_isolation_mode(*mode);
            }
            Action::ExitIsolation => self.store.exit_isolation(),
        }
    }

    fn record(&mut self, region: &str, outcome: SetColorOutcome) {
        let notice = match outcome {
            SetColorOutcome::CapacityExceeded(full) => full.into(),
            SetColorOutcome::Hidden => Notice::Hidden {
                region: region.to_string(),
            },
            SetColorOutcome::UnknownRegion => Notice::UnknownRegion {
                region: region.to_string(),
            },
            SetColorOutcome::Applied | SetColorOutcome::Cleared | SetColorOutcome::Unchanged => {
                return
            }
        };
        self.notices.push(notice);
    }

    fn record_purge(&mut self, purged: Vec<String>) {
        if !purged.is_empty() {
            self.notices.push(Notice::Purged { regions: purged });
        }
    }
}
