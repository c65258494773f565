//! Application-wide constants.
//!
//! This module defines the application name, legend layout metrics, export
//! naming, and the geographic reference tables (state FIPS codes and US Census
//! groupings) used to resolve region groups.

use crate::models::RgbColor;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "CountyMap";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "countymap";

/// Default cap on distinct legend colors.
pub const DEFAULT_MAX_LEGEND_COLORS: usize = 20;

/// Default maximum legend label length, in characters.
pub const DEFAULT_MAX_LABEL_LEN: usize = 50;

// Legend layout metrics, in unscaled pixels.

/// Outer padding around the legend box.
pub const LEGEND_PADDING: f64 = 12.0;
/// Side length of a color swatch.
pub const LEGEND_SWATCH_SIZE: f64 = 18.0;
/// Gap between a swatch and its label.
pub const LEGEND_SWATCH_GAP: f64 = 8.0;
/// Approximate advance width of one label character at the legend font size.
pub const LEGEND_CHAR_WIDTH: f64 = 7.5;
/// Height of a single legend row.
pub const LEGEND_ROW_HEIGHT: f64 = 24.0;
/// Height reserved for the legend title.
pub const LEGEND_TITLE_HEIGHT: f64 = 24.0;
/// Font size used for legend labels.
pub const LEGEND_FONT_SIZE: f64 = 13.0;
/// Title drawn above the legend rows.
pub const LEGEND_TITLE: &str = "Map Key";

/// Default unscaled map width used by the export composer.
pub const DEFAULT_MAP_WIDTH: u32 = 975;
/// Default unscaled map height used by the export composer.
pub const DEFAULT_MAP_HEIGHT: u32 = 610;

/// Fill of uncolored regions.
pub const DEFAULT_REGION_FILL: RgbColor = RgbColor::new(0xD3, 0xD3, 0xD3);
/// Stroke of region borders.
pub const REGION_STROKE: RgbColor = RgbColor::new(0xFF, 0xFF, 0xFF);
/// Text color of legend labels.
pub const LEGEND_TEXT: RgbColor = RgbColor::new(0x33, 0x33, 0x33);
/// Outer margin around the projected map, in unscaled pixels.
pub const MAP_MARGIN: f64 = 10.0;
/// Largest width or height accepted for an exported image, in pixels.
pub const MAX_EXPORT_DIMENSION: u32 = 16_384;

/// Filename prefix for exported images.
pub const EXPORT_FILE_PREFIX: &str = "us-county-map";

/// Value written for metadata fields that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// State and territory FIPS codes with their names.
pub const STATE_FIPS: &[(&str, &str)] = &[
    ("01", "Alabama"),
    ("02", "Alaska"),
    ("04", "Arizona"),
    ("05", "Arkansas"),
    ("06", "California"),
    ("08", "Colorado"),
    ("09", "Connecticut"),
    ("10", "Delaware"),
    ("11", "District of Columbia"),
    ("12", "Florida"),
    ("13", "Georgia"),
    ("15", "Hawaii"),
    ("16", "Idaho"),
    ("17", "Illinois"),
    ("18", "Indiana"),
    ("19", "Iowa"),
    ("20", "Kansas"),
    ("21", "Kentucky"),
    ("22", "Louisiana"),
    ("23", "Maine"),
    ("24", "Maryland"),
    ("25", "Massachusetts"),
    ("26", "Michigan"),
    ("27", "Minnesota"),
    ("28", "Mississippi"),
    ("29", "Missouri"),
    ("30", "Montana"),
    ("31", "Nebraska"),
    ("32", "Nevada"),
    ("33", "New Hampshire"),
    ("34", "New Jersey"),
    ("35", "New Mexico"),
    ("36", "New York"),
    ("37", "North Carolina"),
    ("38", "North Dakota"),
    ("39", "Ohio"),
    ("40", "Oklahoma"),
    ("41", "Oregon"),
    ("42", "Pennsylvania"),
    ("44", "Rhode Island"),
    ("45", "South Carolina"),
    ("46", "South Dakota"),
    ("47", "Tennessee"),
    ("48", "Texas"),
    ("49", "Utah"),
    ("50", "Vermont"),
    ("51", "Virginia"),
    ("53", "Washington"),
    ("54", "West Virginia"),
    ("55", "Wisconsin"),
    ("56", "Wyoming"),
    ("60", "American Samoa"),
    ("66", "Guam"),
    ("69", "Northern Mariana Islands"),
    ("72", "Puerto Rico"),
    ("78", "United States Virgin Islands"),
];

/// US Census divisions as `(division, region, member states)`.
pub const CENSUS_DIVISIONS: &[(&str, &str, &[&str])] = &[
    (
        "New England",
        "Northeast",
        &[
            "Connecticut",
            "Maine",
            "Massachusetts",
            "New Hampshire",
            "Rhode Island",
            "Vermont",
        ],
    ),
    (
        "Middle Atlantic",
        "Northeast",
        &["New Jersey", "New York", "Pennsylvania"],
    ),
    (
        "East North Central",
        "Midwest",
        &["Illinois", "Indiana", "Michigan", "Ohio", "Wisconsin"],
    ),
    (
        "West North Central",
        "Midwest",
        &[
            "Iowa",
            "Kansas",
            "Minnesota",
            "Missouri",
            "Nebraska",
            "North Dakota",
            "South Dakota",
        ],
    ),
    (
        "South Atlantic",
        "South",
        &[
            "Delaware",
            "District of Columbia",
            "Florida",
            "Georgia",
            "Maryland",
            "North Carolina",
            "South Carolina",
            "Virginia",
            "West Virginia",
        ],
    ),
    (
        "East South Central",
        "South",
        &["Alabama", "Kentucky", "Mississippi", "Tennessee"],
    ),
    (
        "West South Central",
        "South",
        &["Arkansas", "Louisiana", "Oklahoma", "Texas"],
    ),
    (
        "Mountain",
        "West",
        &[
            "Arizona",
            "Colorado",
            "Idaho",
            "Montana",
            "Nevada",
            "New Mexico",
            "Utah",
            "Wyoming",
        ],
    ),
    (
        "Pacific",
        "West",
        &["Alaska", "California", "Hawaii", "Oregon", "Washington"],
    ),
];

/// Looks up a state name by its two-digit FIPS code.
#[must_use]
pub fn state_name_for_fips(fips: &str) -> Option<&'static str> {
    STATE_FIPS
        .iter()
        .find(|(code, _)| *code == fips)
        .map(|(_, name)| *name)
}

/// Expands a Census region or division name into its member state names.
///
/// Matching is case-insensitive. Returns `None` for names that are neither.
#[must_use]
pub fn census_group_states(group: &str) -> Option<Vec<&'static str>> {
    let states: Vec<&'static str> = CENSUS_DIVISIONS
        .iter()
        .filter(|(division, region, _)| {
            division.eq_ignore_ascii_case(group) || region.eq_ignore_ascii_case(group)
        })
        .flat_map(|(_, _, states)| states.iter().copied())
        .collect();

    if states.is_empty() {
        None
    } else {
        Some(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_name_for_fips() {
        assert_eq!(state_name_for_fips("48"), Some("Texas"));
        assert_eq!(state_name_for_fips("11"), Some("District of Columbia"));
        assert_eq!(state_name_for_fips("03"), None);
    }

    #[test]
    fn test_census_region_expands_divisions() {
        let south = census_group_states("south").unwrap();
        assert!(south.contains(&"Texas"));
        assert!(south.contains(&"Florida"));
        assert!(!south.contains(&"California"));
        assert_eq!(south.len(), 17);
    }

    #[test]
    fn test_census_division() {
        let pacific = census_group_states("Pacific").unwrap();
        assert_eq!(pacific.len(), 5);
        assert!(census_group_states("Atlantis").is_none());
    }

    #[test]
    fn test_census_covers_fifty_states_and_dc() {
        let total: usize = CENSUS_DIVISIONS.iter().map(|(_, _, s)| s.len()).sum();
        assert_eq!(total, 51);
    }
}
