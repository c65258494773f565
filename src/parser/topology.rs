//! TopoJSON decoder for us-atlas style topologies.
//!
//! Expects `objects.states` and/or `objects.counties` geometry collections
//! whose ids are FIPS codes (two digits for states, five for counties) and
//! whose `properties.name` carries the display name. Arcs may be quantized
//! (with a `transform`) or absolute.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::{GeoCatalog, Polygon, Region, RegionKind, Ring};

/// Top-level TopoJSON document (only the parts the catalog needs).
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    /// Quantization transform, if the arcs are delta-encoded
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Shared arcs
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    /// Named geometry objects
    #[serde(default)]
    pub objects: BTreeMap<String, TopoObject>,
}

/// Quantization transform.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    /// Scale per axis
    pub scale: [f64; 2],
    /// Translation per axis
    pub translate: [f64; 2],
}

/// A named object, normally a `GeometryCollection`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopoObject {
    /// Member geometries
    #[serde(default)]
    pub geometries: Vec<TopoGeometry>,
}

/// One geometry of a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct TopoGeometry {
    /// "Polygon", "MultiPolygon", ... (null for empty geometries)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Arc references, nesting depends on `kind`
    #[serde(default)]
    pub arcs: Value,
    /// Feature id (string or number)
    #[serde(default)]
    pub id: Option<Value>,
    /// Feature properties
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Decodes a TopoJSON string into a catalog.
pub fn decode_topology(json: &str) -> Result<GeoCatalog> {
    let topology: Topology =
        serde_json::from_str(json).context("Failed to parse TopoJSON topology")?;
    catalog_from_topology(&topology)
}

/// Builds a catalog from a parsed topology.
pub fn catalog_from_topology(topology: &Topology) -> Result<GeoCatalog> {
    let states = topology.objects.get("states");
    let counties = topology.objects.get("counties");

    if states.is_none() && counties.is_none() {
        anyhow::bail!("Topology has neither a 'states' nor a 'counties' object");
    }

    let arcs = decode_arcs(&topology.arcs, topology.transform.as_ref());
    let mut regions = Vec::new();
    let mut state_names = BTreeMap::new();

    for geometry in states.map(|o| o.geometries.as_slice()).unwrap_or_default() {
        let Some(id) = geometry_id(geometry, 2) else {
            continue;
        };
        let name = geometry_name(geometry).unwrap_or_else(|| id.clone());
        let polygons = geometry_polygons(geometry, &arcs)
            .with_context(|| format!("Invalid geometry for state '{id}'"))?;

        state_names.insert(id.clone(), name.clone());
        regions.push(Region::new(id, name, None, RegionKind::State).with_geometry(polygons));
    }

    for geometry in counties.map(|o| o.geometries.as_slice()).unwrap_or_default() {
        let Some(id) = geometry_id(geometry, 5) else {
            continue;
        };
        let name = geometry_name(geometry).unwrap_or_else(|| id.clone());
        let parent = id
            .get(..2)
            .and_then(|fips| {
                state_names
                    .get(fips)
                    .cloned()
                    .or_else(|| crate::constants::state_name_for_fips(fips).map(str::to_string))
            });
        let polygons = geometry_polygons(geometry, &arcs)
            .with_context(|| format!("Invalid geometry for county '{id}'"))?;

        regions.push(Region::new(id, name, parent, RegionKind::County).with_geometry(polygons));
    }

    Ok(GeoCatalog::new(regions, state_names))
}

/// Decodes every arc into absolute positions.
fn decode_arcs(raw: &[Vec<Vec<f64>>], transform: Option<&Transform>) -> Vec<Ring> {
    raw.iter()
        .map(|arc| {
            let mut x = 0.0;
            let mut y = 0.0;
            arc.iter()
                .filter(|p| p.len() >= 2)
                .map(|p| match transform {
                    Some(t) => {
                        x += p[0];
                        y += p[1];
                        [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                    }
                    None => [p[0], p[1]],
                })
                .collect()
        })
        .collect()
}

/// Joins arcs into a ring. Negative indices (`!i`) mean the arc is reversed.
fn stitch_ring(indices: &[i64], arcs: &[Ring]) -> Result<Ring> {
    let mut ring: Ring = Vec::new();

    for &index in indices {
        let (slot, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(slot)
            .ok()
            .and_then(|slot| arcs.get(slot))
            .with_context(|| format!("Arc index {index} out of range ({} arcs)", arcs.len()))?;

        let mut points = arc.clone();
        if reversed {
            points.reverse();
        }
        // Consecutive arcs share their junction point.
        let skip = usize::from(!ring.is_empty());
        ring.extend(points.into_iter().skip(skip));
    }

    Ok(ring)
}

fn geometry_polygons(geometry: &TopoGeometry, arcs: &[Ring]) -> Result<Vec<Polygon>> {
    let to_polygon = |rings: &Vec<Vec<i64>>| -> Result<Polygon> {
        rings.iter().map(|ring| stitch_ring(ring, arcs)).collect()
    };

    match geometry.kind.as_deref() {
        Some("Polygon") => {
            let rings: Vec<Vec<i64>> = serde_json::from_value(geometry.arcs.clone())
                .context("Polygon arcs must be a list of rings")?;
            Ok(vec![to_polygon(&rings)?])
        }
        Some("MultiPolygon") => {
            let polygons: Vec<Vec<Vec<i64>>> = serde_json::from_value(geometry.arcs.clone())
                .context("MultiPolygon arcs must be a list of polygons")?;
            polygons.iter().map(to_polygon).collect()
        }
        _ => Ok(Vec::new()),
    }
}

fn geometry_id(geometry: &TopoGeometry, width: usize) -> Option<String> {
    match geometry.id.as_ref()? {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => n.as_u64().map(|n| format!("{n:0width$}")),
        _ => None,
    }
}

fn geometry_name(geometry: &TopoGeometry) -> Option<String> {
    geometry
        .properties
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1.0, 1.0], "translate": [-100.0, 30.0]},
        "arcs": [
            [[0, 0], [2, 0], [0, 2]],
            [[2, 2], [-2, 0], [0, -2]],
            [[2, 0], [1, 0], [0, 2], [-1, 0]]
        ],
        "objects": {
            "states": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[0, 1]], "id": "48", "properties": {"name": "Texas"}},
                {"type": "MultiPolygon", "arcs": [[[2, -1]]], "id": 40, "properties": {"name": "Oklahoma"}}
            ]},
            "counties": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[0, 1]], "id": "48453", "properties": {"name": "Travis"}},
                {"type": null, "id": "48999"},
                {"type": "Polygon", "arcs": [[0, 1]], "properties": {"name": "No id"}}
            ]}
        }
    }"#;

    #[test]
    fn test_decode_states_and_counties() {
        let catalog = decode_topology(SAMPLE).unwrap();

        assert_eq!(catalog.get("48").unwrap().name, "Texas");
        assert_eq!(catalog.get("40").unwrap().name, "Oklahoma");
        let travis = catalog.get("48453").unwrap();
        assert_eq!(travis.kind, RegionKind::County);
        assert_eq!(travis.parent.as_deref(), Some("Texas"));
        assert_eq!(catalog.state_names().get("48").map(String::as_str), Some("Texas"));

        // Null geometry keeps the region; geometry without id is skipped.
        assert!(catalog.get("48999").unwrap().geometry.is_empty());
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let catalog = decode_topology(SAMPLE).unwrap();
        let ring = &catalog.get("48").unwrap().geometry[0][0];

        assert_eq!(
            ring,
            &vec![
                [-100.0, 30.0],
                [-98.0, 30.0],
                [-98.0, 32.0],
                [-100.0, 32.0],
                [-100.0, 30.0],
            ]
        );
    }

    #[test]
    fn test_reversed_arc_reference() {
        let catalog = decode_topology(SAMPLE).unwrap();
        let ring = &catalog.get("40").unwrap().geometry[0][0];

        assert_eq!(ring.first(), Some(&[-98.0, 30.0]));
        // Arc 0 reversed ends at its own start point.
        assert_eq!(ring.last(), Some(&[-100.0, 30.0]));
    }

    #[test]
    fn test_numeric_ids_are_zero_padded() {
        let catalog = decode_topology(SAMPLE).unwrap();
        assert!(catalog.contains("40"));
    }

    #[test]
    fn test_out_of_range_arc_fails() {
        let json = r#"{"type": "Topology", "arcs": [],
            "objects": {"states": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[3]], "id": "01", "properties": {"name": "Alabama"}}
            ]}}}"#;
        let err = decode_topology(json).unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));
    }

    #[test]
    fn test_missing_objects_fails() {
        assert!(decode_topology(r#"{"type": "Topology", "arcs": [], "objects": {}}"#).is_err());
    }

    #[test]
    fn test_absolute_arcs_without_transform() {
        let arcs = decode_arcs(&[vec![vec![1.0, 2.0], vec![3.0, 4.0]]], None);
        assert_eq!(arcs, vec![vec![[1.0, 2.0], [3.0, 4.0]]]);
    }
}
