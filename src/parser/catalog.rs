//! Region catalog loading from TopoJSON or GeoJSON files.

use anyhow::{Context, Result};
use geojson::feature::Id;
use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::topology::decode_topology;
use crate::constants::state_name_for_fips;
use crate::models::{GeoCatalog, Polygon, Region, RegionKind};

/// Loads a catalog from a file, detecting the format from its `type`.
///
/// `"Topology"` documents go through the TopoJSON decoder; anything else
/// must be a GeoJSON `FeatureCollection`.
pub fn load_catalog(path: &Path) -> Result<GeoCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read map file: {}", path.display()))?;

    let catalog = parse_catalog(&content)
        .with_context(|| format!("Failed to load map file: {}", path.display()))?;

    debug!(
        "Loaded {} regions ({} states) from {}",
        catalog.len(),
        catalog.regions_of_kind(RegionKind::State).count(),
        path.display()
    );
    Ok(catalog)
}

/// Parses catalog content already in memory.
pub fn parse_catalog(content: &str) -> Result<GeoCatalog> {
    let value: JsonValue = serde_json::from_str(content).context("Map file is not valid JSON")?;

    match value.get("type").and_then(JsonValue::as_str) {
        Some("Topology") => decode_topology(content),
        Some(_) => {
            let geojson = GeoJson::from_json_value(value).context("Invalid GeoJSON document")?;
            catalog_from_geojson(geojson)
        }
        None => anyhow::bail!("Map file has no 'type' field"),
    }
}

/// Builds a catalog from a GeoJSON feature collection.
///
/// Each feature needs an id (feature `id` or an `id`/`GEOID`/`fips`
/// property). The name comes from `name`/`NAME`. `kind` may be given
/// explicitly; otherwise five-character ids are counties and the rest
/// states. County parents come from a `state` property or the FIPS prefix.
pub fn catalog_from_geojson(geojson: GeoJson) -> Result<GeoCatalog> {
    let GeoJson::FeatureCollection(collection) = geojson else {
        anyhow::bail!("Expected a GeoJSON FeatureCollection");
    };

    let mut regions = Vec::with_capacity(collection.features.len());
    let mut state_names = BTreeMap::new();

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(id) = feature_id(feature) else {
            debug!("Skipping feature #{index} without an id");
            continue;
        };
        let name = string_property(feature, &["name", "NAME"]).unwrap_or_else(|| id.clone());
        let kind = match string_property(feature, &["kind"]).as_deref() {
            Some("county") => RegionKind::County,
            Some("state") => RegionKind::State,
            Some(other) => anyhow::bail!("Feature '{id}' has unknown kind '{other}'"),
            None if id.len() == 5 && id.chars().all(|c| c.is_ascii_digit()) => RegionKind::County,
            None => RegionKind::State,
        };

        let parent = match kind {
            RegionKind::State => {
                state_names.insert(id.clone(), name.clone());
                None
            }
            RegionKind::County => string_property(feature, &["state", "STATE_NAME"])
                .or_else(|| id.get(..2).and_then(state_name_for_fips).map(str::to_string)),
        };

        regions.push(Region::new(id, name, parent, kind).with_geometry(feature_polygons(feature)));
    }

    Ok(GeoCatalog::new(regions, state_names))
}

fn feature_id(feature: &Feature) -> Option<String> {
    match &feature.id {
        Some(Id::String(id)) => Some(id.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => string_property(feature, &["id", "GEOID", "fips"]),
    }
}

fn string_property(feature: &Feature, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match feature.property(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn feature_polygons(feature: &Feature) -> Vec<Polygon> {
    let to_polygon = |rings: &Vec<Vec<Vec<f64>>>| -> Polygon {
        rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| [p[0], p[1]])
                    .collect()
            })
            .collect()
    };

    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Polygon(rings)) => vec![to_polygon(rings)],
        Some(geojson::Value::MultiPolygon(polygons)) => polygons.iter().map(to_polygon).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FEATURES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "48",
             "properties": {"name": "Texas"},
             "geometry": {"type": "Polygon", "coordinates": [[[-106, 26], [-94, 26], [-94, 36], [-106, 26]]]}},
            {"type": "Feature",
             "properties": {"GEOID": "48453", "NAME": "Travis"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[-98, 30], [-97, 30], [-97, 31], [-98, 30]]]]}},
            {"type": "Feature", "id": "Bay Area",
             "properties": {"name": "Bay Area", "kind": "county", "state": "California"},
             "geometry": null},
            {"type": "Feature", "properties": {"name": "Nameless"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_parse_geojson_collection() {
        let catalog = parse_catalog(FEATURES).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("48").unwrap().kind, RegionKind::State);

        let travis = catalog.get("48453").unwrap();
        assert_eq!(travis.name, "Travis");
        assert_eq!(travis.kind, RegionKind::County);
        assert_eq!(travis.parent.as_deref(), Some("Texas"));
        assert_eq!(travis.geometry.len(), 1);

        let bay = catalog.get("Bay Area").unwrap();
        assert_eq!(bay.kind, RegionKind::County);
        assert_eq!(bay.parent.as_deref(), Some("California"));
        assert!(bay.geometry.is_empty());
    }

    #[test]
    fn test_parse_detects_topology() {
        let topo = r#"{"type": "Topology", "arcs": [],
            "objects": {"states": {"type": "GeometryCollection", "geometries": [
                {"type": null, "id": "06", "properties": {"name": "California"}}
            ]}}}"#;
        let catalog = parse_catalog(topo).unwrap();
        assert_eq!(catalog.get("06").unwrap().name, "California");
    }

    #[test]
    fn test_parse_rejects_single_feature_and_untyped() {
        let feature = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(parse_catalog(feature).is_err());
        assert!(parse_catalog(r#"{"features": []}"#).is_err());
        assert!(parse_catalog("not json").is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "x", "properties": {"kind": "city"}, "geometry": null}
        ]}"#;
        let err = parse_catalog(json).unwrap_err();
        assert!(err.to_string().contains("unknown kind"));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FEATURES.as_bytes()).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert!(catalog.contains("48453"));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/map.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read map file"));
    }
}
