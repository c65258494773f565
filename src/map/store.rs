//! Selection store: the authoritative record of which region has which colors.
//!
//! The store owns the color assignments, the legend derived from them and
//! the isolation filter that decides which regions may be colored. Every
//! mutation keeps the three consistent and then notifies observers with a
//! full snapshot, synchronously and in registration order.

use crate::map::isolation::{IsolationFilter, IsolationMode};
use crate::map::legend::{LegendFull, LegendIndex, LegendRow};
use crate::map::multi_color::{self, Outcome};
use crate::models::{ColorList, GeoCatalog, RegionKind, RgbColor};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Colors of one selected region plus the display fields the legend and
/// tooltips need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Assigned colors, top first (never empty while stored)
    pub colors: ColorList,
    /// Region display name
    pub name: String,
    /// Parent state name, for counties
    pub parent: Option<String>,
    /// Legend labels of `colors`, in the same order
    pub labels: Vec<String>,
}

impl Selection {
    /// Tooltip text, e.g. `Travis, Texas: Won / Label 2`.
    #[must_use]
    pub fn tooltip(&self) -> String {
        let place = match &self.parent {
            Some(parent) => format!("{}, {}", self.name, parent),
            None => self.name.clone(),
        };
        if self.labels.is_empty() {
            place
        } else {
            format!("{place}: {}", self.labels.join(" / "))
        }
    }
}

/// What happened to a color request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetColorOutcome {
    /// The region now has the requested colors
    Applied,
    /// The region went back to the default fill
    Cleared,
    /// The request did not change anything
    Unchanged,
    /// The region is outside the isolated subset
    Hidden,
    /// The catalog does not know the region
    UnknownRegion,
    /// A new color would exceed the legend limit
    CapacityExceeded(LegendFull),
}

impl SetColorOutcome {
    /// Returns true if state changed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Applied | Self::Cleared)
    }
}

/// Full state handed to observers after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSnapshot {
    /// Multi-color mode flag
    pub multi_color: bool,
    /// Region id → colors
    pub assignments: BTreeMap<String, ColorList>,
    /// Legend rows in display order
    pub legend: Vec<LegendRow>,
    /// Isolation sub-mode, if active
    pub isolation: Option<IsolationMode>,
    /// Visible region ids while isolated
    pub visible: BTreeSet<String>,
}

/// Change-notification callback.
pub type Observer = Box<dyn FnMut(&SelectionSnapshot)>;

/// Authoritative color state of the map.
pub struct SelectionStore {
    catalog: Arc<GeoCatalog>,
    selections: BTreeMap<String, Selection>,
    legend: LegendIndex,
    isolation: IsolationFilter,
    multi_color: bool,
    observers: Vec<Observer>,
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("selections", &self.selections)
            .field("legend", &self.legend)
            .field("isolation", &self.isolation)
            .field("multi_color", &self.multi_color)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl SelectionStore {
    /// Creates an empty store with default legend limits.
    #[must_use]
    pub fn new(catalog: Arc<GeoCatalog>) -> Self {
        Self::with_legend(catalog, LegendIndex::default())
    }

    /// Creates an empty store using the given (empty) legend and its limits.
    #[must_use]
    pub fn with_legend(catalog: Arc<GeoCatalog>, legend: LegendIndex) -> Self {
        Self {
            catalog,
            selections: BTreeMap::new(),
            legend,
            isolation: IsolationFilter::new(),
            multi_color: false,
            observers: Vec::new(),
        }
    }

    /// The catalog this store colors.
    #[must_use]
    pub fn catalog(&self) -> &Arc<GeoCatalog> {
        &self.catalog
    }

    /// Current legend.
    #[must_use]
    pub const fn legend(&self) -> &LegendIndex {
        &self.legend
    }

    /// Current isolation filter.
    #[must_use]
    pub const fn isolation(&self) -> &IsolationFilter {
        &self.isolation
    }

    /// Multi-color mode flag.
    #[must_use]
    pub const fn multi_color(&self) -> bool {
        self.multi_color
    }

    /// Colors of a region; empty when unselected.
    #[must_use]
    pub fn color(&self, region_id: &str) -> ColorList {
        self.selections
            .get(region_id)
            .map(|s| s.colors.clone())
            .unwrap_or_default()
    }

    /// Selection record of a region, if colored.
    #[must_use]
    pub fn selection(&self, region_id: &str) -> Option<&Selection> {
        self.selections.get(region_id)
    }

    /// All selections in region id order.
    pub fn selections(&self) -> impl Iterator<Item = (&String, &Selection)> {
        self.selections.iter()
    }

    /// Registers an observer called after every mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&SelectionSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Full state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            multi_color: self.multi_color,
            assignments: self
                .selections
                .iter()
                .map(|(id, s)| (id.clone(), s.colors.clone()))
                .collect(),
            legend: self.legend.rows(),
            isolation: self.isolation.mode(),
            visible: self.isolation.visible().clone(),
        }
    }

    /// Replaces a region's colors. An empty list clears the region.
    ///
    /// Requests for unknown or hidden regions are ignored. A request that
    /// would introduce a color past the legend limit is rejected as a whole.
    pub fn set_color(&mut self, region_id: &str, colors: ColorList) -> SetColorOutcome {
        if !self.catalog.contains(region_id) {
            debug!("Ignoring color for unknown region '{region_id}'");
            return SetColorOutcome::UnknownRegion;
        }
        if !self.isolation.is_visible(region_id) {
            debug!("Ignoring color for region '{region_id}' outside isolation");
            return SetColorOutcome::Hidden;
        }

        let colors = if self.multi_color {
            colors
        } else {
            colors.truncated_to_top()
        };

        let current = self.color(region_id);
        if current == colors {
            return SetColorOutcome::Unchanged;
        }

        if let Err(full) = self.check_capacity(region_id, &current, &colors) {
            warn!("{full}");
            return SetColorOutcome::CapacityExceeded(full);
        }

        self.commit(region_id, &current, colors.clone());
        self.refresh_labels();
        self.notify();

        if colors.is_empty() {
            SetColorOutcome::Cleared
        } else {
            SetColorOutcome::Applied
        }
    }

    /// Applies a requested color through the multi-color rules.
    pub fn apply_color(&mut self, region_id: &str, color: RgbColor) -> SetColorOutcome {
        if !self.catalog.contains(region_id) {
            return SetColorOutcome::UnknownRegion;
        }
        if !self.isolation.is_visible(region_id) {
            return SetColorOutcome::Hidden;
        }

        let current = self.color(region_id);
        match multi_color::apply(&current, color, self.multi_color) {
            Outcome::Unchanged => SetColorOutcome::Unchanged,
            Outcome::Assign(list) => self.set_color(region_id, list),
        }
    }

    /// Applies a color to every visible member of a region group.
    ///
    /// Counties are colored when the group contains any, otherwise states.
    /// Returns the outcome for each member in id order.
    pub fn apply_color_to_group(
        &mut self,
        group: &str,
        color: RgbColor,
    ) -> Vec<(String, SetColorOutcome)> {
        let members = self.catalog.group_members(group);
        let has_counties = members.iter().any(|id| {
            self.catalog
                .get(id)
                .is_some_and(|r| r.kind == RegionKind::County)
        });
        let leaf_kind = if has_counties {
            RegionKind::County
        } else {
            RegionKind::State
        };

        let targets: Vec<String> = members
            .into_iter()
            .filter(|id| self.catalog.get(id).is_some_and(|r| r.kind == leaf_kind))
            .filter(|id| self.isolation.is_visible(id))
            .collect();

        targets
            .into_iter()
            .map(|id| {
                let outcome = self.apply_color(&id, color);
                (id, outcome)
            })
            .collect()
    }

    /// Clears every assignment and legend entry.
    pub fn clear_all(&mut self) {
        self.selections.clear();
        self.legend.clear();
        self.notify();
    }

    /// Turns multi-color mode on or off.
    ///
    /// Turning it off keeps only the top color of every split region.
    pub fn set_multi_color(&mut self, enabled: bool) {
        if self.multi_color == enabled {
            return;
        }
        self.multi_color = enabled;

        if !enabled {
            let splits: Vec<(String, ColorList)> = self
                .selections
                .iter()
                .filter(|(_, s)| s.colors.len() > 1)
                .map(|(id, s)| (id.clone(), s.colors.clone()))
                .collect();
            for (id, current) in splits {
                let top = current.truncated_to_top();
                self.commit(&id, &current, top);
            }
            self.refresh_labels();
        }

        self.notify();
    }

    /// Renames a legend color and updates the tooltips of its regions.
    ///
    /// Returns the effective (truncated) label, or `None` if the color is not
    /// on the map.
    pub fn relabel(&mut self, color: RgbColor, label: &str) -> Option<String> {
        let applied = self.legend.relabel(color, label)?;
        self.refresh_labels();
        self.notify();
        Some(applied)
    }

    /// Enters region-mode isolation and purges colors outside the groups.
    ///
    /// Returns the ids whose colors were cleared.
    pub fn isolate_groups(&mut self, groups: BTreeSet<String>) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        self.isolation.enter_groups(groups, &catalog);
        self.after_visibility_change()
    }

    /// Enters custom-mode isolation and purges colors outside `regions`.
    ///
    /// Returns the ids whose colors were cleared.
    pub fn isolate_custom(&mut self, regions: BTreeSet<String>) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        self.isolation.enter_custom(regions, &catalog);
        self.after_visibility_change()
    }

    /// Toggles a group in region mode; returns the purged ids.
    pub fn toggle_isolation_group(&mut self, group: &str) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        if !self.isolation.toggle_group(group, &catalog) {
            return Vec::new();
        }
        self.after_visibility_change()
    }

    /// Toggles a region in custom mode; returns the purged ids.
    pub fn toggle_isolation_region(&mut self, region_id: &str) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        if !self.isolation.toggle_region(region_id, &catalog) {
            return Vec::new();
        }
        self.after_visibility_change()
    }

    /// Switches the isolation sub-mode. Visibility and colors are untouched.
    pub fn switch_isolation_mode(&mut self, mode: IsolationMode) -> bool {
        let catalog = Arc::clone(&self.catalog);
        let switched = self.isolation.switch_mode(mode, &catalog);
        if switched {
            self.notify();
        }
        switched
    }

    /// Leaves isolation.
    ///
    /// This discards every color and legend entry, not only those of the
    /// isolated subset.
    pub fn exit_isolation(&mut self) {
        self.isolation.exit();
        self.selections.clear();
        self.legend.clear();
        self.notify();
    }

    fn after_visibility_change(&mut self) -> Vec<String> {
        let hidden: Vec<String> = self
            .selections
            .keys()
            .filter(|id| !self.isolation.is_visible(id))
            .cloned()
            .collect();

        for id in &hidden {
            let current = self.color(id);
            self.commit(id, &current, ColorList::empty());
        }
        if !hidden.is_empty() {
            debug!("Isolation cleared colors of {} regions", hidden.len());
            self.refresh_labels();
        }

        self.notify();
        hidden
    }

    fn check_capacity(
        &self,
        region_id: &str,
        current: &ColorList,
        next: &ColorList,
    ) -> Result<(), LegendFull> {
        let added: Vec<RgbColor> = next
            .iter()
            .filter(|c| !self.legend.contains(*c))
            .collect();
        let Some(&first_added) = added.first() else {
            return Ok(());
        };

        let freed = current
            .iter()
            .filter(|c| !next.contains(*c))
            .filter(|c| {
                self.legend
                    .entry(*c)
                    .is_some_and(|e| e.members.len() == 1 && e.members.contains(region_id))
            })
            .count();

        let limit = self.legend.max_colors();
        if self.legend.len() - freed + added.len() > limit {
            return Err(LegendFull {
                color: first_added,
                limit,
            });
        }
        Ok(())
    }

    /// Writes `next` without visibility or capacity checks.
    fn commit(&mut self, region_id: &str, current: &ColorList, next: ColorList) {
        for color in current.iter().filter(|c| !next.contains(*c)) {
            self.legend.remove(region_id, color);
        }
        for color in next.iter().filter(|c| !current.contains(*c)) {
            if let Err(full) = self.legend.upsert(region_id, color) {
                warn!("{full}");
            }
        }

        if next.is_empty() {
            self.selections.remove(region_id);
            return;
        }

        let (name, parent) = self
            .catalog
            .get(region_id)
            .map(|r| (r.name.clone(), r.parent.clone()))
            .unwrap_or_else(|| (region_id.to_string(), None));

        self.selections.insert(
            region_id.to_string(),
            Selection {
                colors: next,
                name,
                parent,
                labels: Vec::new(),
            },
        );
    }

    fn refresh_labels(&mut self) {
        for selection in self.selections.values_mut() {
            selection.labels = selection
                .colors
                .iter()
                .filter_map(|c| self.legend.label(c))
                .collect();
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use std::cell::RefCell;
    use std::rc::Rc;

    const RED: RgbColor = RgbColor::new(0xFF, 0, 0);
    const GREEN: RgbColor = RgbColor::new(0, 0xFF, 0);
    const BLUE: RgbColor = RgbColor::new(0, 0, 0xFF);
    const TEAL: RgbColor = RgbColor::new(0xAB, 0xCD, 0xEF);

    fn catalog() -> Arc<GeoCatalog> {
        let texas = Some("Texas".to_string());
        Arc::new(GeoCatalog::new(
            vec![
                Region::new("Texas", "Texas", None, RegionKind::State),
                Region::new("Oklahoma", "Oklahoma", None, RegionKind::State),
                Region::new("California", "California", None, RegionKind::State),
                Region::new("A", "Alpha", None, RegionKind::State),
                Region::new("B", "Bravo", None, RegionKind::State),
                Region::new("48453", "Travis", texas.clone(), RegionKind::County),
                Region::new("48201", "Harris", texas, RegionKind::County),
            ],
            BTreeMap::new(),
        ))
    }

    fn gray(n: u8) -> RgbColor {
        RgbColor::new(n, n, n)
    }

    fn many_regions(count: u8) -> Arc<GeoCatalog> {
        Arc::new(GeoCatalog::new(
            (0..count)
                .map(|n| Region::new(format!("r{n}"), format!("R{n}"), None, RegionKind::State))
                .collect(),
            BTreeMap::new(),
        ))
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_set_empty_clears_region_and_legend() {
        let mut store = SelectionStore::new(catalog());
        store.set_color("Texas", ColorList::single(RED));
        assert_eq!(store.set_color("Texas", ColorList::empty()), SetColorOutcome::Cleared);

        assert!(store.color("Texas").is_empty());
        assert!(store.selection("Texas").is_none());
        assert!(store.legend().entries().all(|e| !e.members.contains("Texas")));
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_unknown_region_ignored() {
        let mut store = SelectionStore::new(catalog());
        assert_eq!(
            store.apply_color("Atlantis", RED),
            SetColorOutcome::UnknownRegion
        );
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_multi_color_scenario_add_split_shift() {
        let mut store = SelectionStore::new(catalog());
        store.set_multi_color(true);

        store.apply_color("A", RED);
        assert_eq!(store.color("A").as_slice(), &[RED]);

        store.apply_color("A", GREEN);
        assert_eq!(store.color("A").as_slice(), &[RED, GREEN]);

        store.apply_color("A", BLUE);
        assert_eq!(store.color("A").as_slice(), &[BLUE, RED]);
        assert!(!store.legend().contains(GREEN));
        assert!(store.legend().entry(BLUE).unwrap().members.contains("A"));
    }

    #[test]
    fn test_evicted_color_kept_when_shared() {
        let mut store = SelectionStore::new(catalog());
        store.set_multi_color(true);
        store.apply_color("B", GREEN);
        store.apply_color("A", RED);
        store.apply_color("A", GREEN);
        store.apply_color("A", BLUE);

        let green = store.legend().entry(GREEN).unwrap();
        assert!(!green.members.contains("A"));
        assert!(green.members.contains("B"));
    }

    #[test]
    fn test_single_mode_toggle_off() {
        let mut store = SelectionStore::new(catalog());
        assert_eq!(store.apply_color("B", RED), SetColorOutcome::Applied);
        assert_eq!(store.apply_color("B", RED), SetColorOutcome::Cleared);
        assert!(store.color("B").is_empty());
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_single_mode_set_color_truncates_split() {
        let mut store = SelectionStore::new(catalog());
        store.set_color("A", ColorList::split(RED, GREEN));
        assert_eq!(store.color("A"), ColorList::single(RED));
    }

    #[test]
    fn test_disabling_multi_color_keeps_top() {
        let mut store = SelectionStore::new(catalog());
        store.set_multi_color(true);
        store.apply_color("A", RED);
        store.apply_color("A", GREEN);
        store.set_multi_color(false);

        assert_eq!(store.color("A"), ColorList::single(RED));
        assert!(!store.legend().contains(GREEN));
    }

    #[test]
    fn test_twenty_first_color_rejected_without_change() {
        let mut store = SelectionStore::new(many_regions(21));
        for n in 0..20 {
            assert_eq!(
                store.apply_color(&format!("r{n}"), gray(n)),
                SetColorOutcome::Applied
            );
        }
        let before = store.snapshot();

        let outcome = store.apply_color("r20", gray(20));
        assert!(matches!(
            outcome,
            SetColorOutcome::CapacityExceeded(LegendFull { limit: 20, .. })
        ));
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.legend().len(), 20);
    }

    #[test]
    fn test_replacing_sole_holder_frees_slot() {
        let mut store = SelectionStore::new(many_regions(21));
        for n in 0..20 {
            store.apply_color(&format!("r{n}"), gray(n));
        }

        // r0 is the only holder of gray(0), so swapping it for a new color fits.
        assert_eq!(store.apply_color("r0", gray(99)), SetColorOutcome::Applied);
        assert_eq!(store.legend().len(), 20);
        assert!(!store.legend().contains(gray(0)));
    }

    #[test]
    fn test_isolation_purges_outside_colors() {
        let mut store = SelectionStore::new(catalog());
        store.apply_color("California", TEAL);
        store.apply_color("Texas", RED);

        let purged = store.isolate_custom(set(&["Texas", "Oklahoma"]));

        assert_eq!(purged, vec!["California".to_string()]);
        assert!(store.color("California").is_empty());
        assert_eq!(store.color("Texas"), ColorList::single(RED));
        assert!(!store.legend().contains(TEAL));
    }

    #[test]
    fn test_hidden_region_rejected_while_isolated() {
        let mut store = SelectionStore::new(catalog());
        store.isolate_custom(set(&["Texas"]));
        let before = store.snapshot();

        assert_eq!(store.apply_color("California", RED), SetColorOutcome::Hidden);
        assert_eq!(
            store.set_color("California", ColorList::single(RED)),
            SetColorOutcome::Hidden
        );
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_exit_isolation_discards_all_colors() {
        let mut store = SelectionStore::new(catalog());
        store.isolate_groups(set(&["Texas"]));
        store.apply_color("48453", RED);
        store.apply_color("48201", GREEN);

        store.exit_isolation();

        assert!(!store.isolation().is_active());
        assert!(store.isolation().visible().is_empty());
        assert_eq!(store.selections().count(), 0);
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_exit_isolation_when_inactive_still_resets() {
        let mut store = SelectionStore::new(catalog());
        store.apply_color("California", TEAL);
        store.apply_color("48453", RED);
        assert!(!store.isolation().is_active());

        store.exit_isolation();

        assert!(!store.isolation().is_active());
        assert!(store.color("California").is_empty());
        assert_eq!(store.selections().count(), 0);
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_toggle_isolation_region_purges() {
        let mut store = SelectionStore::new(catalog());
        store.isolate_custom(set(&["Texas", "Oklahoma"]));
        store.apply_color("Oklahoma", RED);

        let purged = store.toggle_isolation_region("Oklahoma");
        assert_eq!(purged, vec!["Oklahoma".to_string()]);
        assert!(store.legend().is_empty());
    }

    #[test]
    fn test_switch_mode_keeps_colors() {
        let mut store = SelectionStore::new(catalog());
        store.isolate_custom(set(&["Texas"]));
        store.apply_color("Texas", RED);

        assert!(store.switch_isolation_mode(IsolationMode::Region));
        assert_eq!(store.color("Texas"), ColorList::single(RED));
    }

    #[test]
    fn test_group_coloring_prefers_counties() {
        let mut store = SelectionStore::new(catalog());
        let outcomes = store.apply_color_to_group("Texas", RED);

        let ids: Vec<&str> = outcomes.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["48201", "48453"]);
        assert!(store.color("Texas").is_empty());
        assert_eq!(store.legend().entry(RED).unwrap().members.len(), 2);
    }

    #[test]
    fn test_relabel_updates_tooltips() {
        let mut store = SelectionStore::new(catalog());
        store.apply_color("48453", RED);
        assert_eq!(store.selection("48453").unwrap().tooltip(), "Travis, Texas: Label 1");

        let label = store.relabel(RED, "Won").unwrap();
        assert_eq!(label, "Won");
        assert_eq!(store.selection("48453").unwrap().tooltip(), "Travis, Texas: Won");
        assert!(store.relabel(BLUE, "Nope").is_none());
    }

    #[test]
    fn test_observers_called_in_order_with_snapshot() {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut store = SelectionStore::new(catalog());

        let first = Rc::clone(&log);
        store.subscribe(move |snap| {
            first
                .borrow_mut()
                .push(format!("first:{}", snap.assignments.len()));
        });
        let second = Rc::clone(&log);
        store.subscribe(move |snap| {
            second
                .borrow_mut()
                .push(format!("second:{}", snap.legend.len()));
        });

        store.apply_color("A", RED);
        store.apply_color("A", RED);

        assert_eq!(
            *log.borrow(),
            vec!["first:1", "second:1", "first:0", "second:0"]
        );
    }

    #[test]
    fn test_rejected_mutation_does_not_notify() {
        let calls = Rc::new(RefCell::new(0));
        let mut store = SelectionStore::new(catalog());
        let counter = Rc::clone(&calls);
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.apply_color("Atlantis", RED);
        store.set_color("A", ColorList::empty());
        assert_eq!(*calls.borrow(), 0);
    }
}
