//! JSON export of selected regions and their metadata.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::composer::ExportError;
use crate::constants::NOT_AVAILABLE;
use crate::map::SelectionStore;
use crate::models::Region;
use crate::services::RegionMetadata;

/// A column of the JSON export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportField {
    /// Region display name
    RegionName,
    /// Containing state (the state itself for states)
    StateName,
    /// Region id (FIPS code)
    RegionNumber,
    /// Population
    Population,
    /// Latitude, longitude
    Coordinates,
    /// Area with unit
    Area,
    /// Country
    Country,
    /// Official website
    OfficialWebsite,
    /// Capital or county seat
    Capital,
    /// OpenStreetMap relation id
    OsmRelation,
    /// Wikipedia article URL
    Wikipedia,
}

impl ExportField {
    /// Every field in export order.
    pub const ALL: [Self; 11] = [
        Self::RegionName,
        Self::StateName,
        Self::RegionNumber,
        Self::Population,
        Self::Coordinates,
        Self::Area,
        Self::Country,
        Self::OfficialWebsite,
        Self::Capital,
        Self::OsmRelation,
        Self::Wikipedia,
    ];

    /// JSON key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RegionName => "region_name",
            Self::StateName => "state_name",
            Self::RegionNumber => "region_number",
            Self::Population => "population",
            Self::Coordinates => "coordinates",
            Self::Area => "area",
            Self::Country => "country",
            Self::OfficialWebsite => "official_website",
            Self::Capital => "capital",
            Self::OsmRelation => "osm_relation",
            Self::Wikipedia => "wikipedia",
        }
    }

    /// True for fields that come from the knowledge base.
    #[must_use]
    pub const fn needs_metadata(self) -> bool {
        !matches!(self, Self::RegionName | Self::StateName | Self::RegionNumber)
    }

    /// Value of this field for a region, "N/A" when unknown.
    #[must_use]
    pub fn value(self, region: &Region, metadata: Option<&RegionMetadata>) -> String {
        let value = match self {
            Self::RegionName => Some(region.name.clone()),
            Self::StateName => region.state_name().map(str::to_string),
            Self::RegionNumber => Some(region.id.clone()),
            Self::Population => metadata.and_then(|m| m.population).map(|p| p.to_string()),
            Self::Coordinates => metadata.and_then(|m| m.coordinates).map(|c| c.to_string()),
            Self::Area => metadata.and_then(|m| m.area.as_ref()).map(ToString::to_string),
            Self::Country => metadata.and_then(|m| m.country.clone()),
            Self::OfficialWebsite => metadata.and_then(|m| m.official_website.clone()),
            Self::Capital => metadata.and_then(|m| m.capital.clone()),
            Self::OsmRelation => metadata.and_then(|m| m.osm_relation.clone()),
            Self::Wikipedia => metadata.and_then(|m| m.wikipedia.clone()),
        };
        value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

impl fmt::Display for ExportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|f| f.key()).collect();
                anyhow::anyhow!("Unknown field '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// One exported object; keys keep the canonical field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    values: Vec<(ExportField, String)>,
}

impl ExportRecord {
    /// Value of one field, if it was selected.
    #[must_use]
    pub fn get(&self, field: ExportField) -> Option<&str> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for ExportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

/// Sorts and deduplicates a field selection.
#[must_use]
pub fn normalize_fields(fields: &[ExportField]) -> Vec<ExportField> {
    let mut fields = fields.to_vec();
    fields.sort_unstable();
    fields.dedup();
    fields
}

/// Builds one record per colored region, in region-id order.
///
/// `metadata` is keyed by region id; regions without an entry get "N/A"
/// for every knowledge-base field.
#[must_use]
pub fn build_records(
    store: &SelectionStore,
    metadata: &BTreeMap<String, RegionMetadata>,
    fields: &[ExportField],
) -> Vec<ExportRecord> {
    let fields = normalize_fields(fields);
    let catalog = store.catalog();

    store
        .selections()
        .filter_map(|(id, _)| catalog.get(id))
        .map(|region| ExportRecord {
            values: fields
                .iter()
                .map(|field| (*field, field.value(region, metadata.get(&region.id))))
                .collect(),
        })
        .collect()
}

/// Pretty-printed JSON array of records.
pub fn to_json(records: &[ExportRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}
