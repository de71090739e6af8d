//! Structural normalization of arbitrary dataset payloads.

use serde_json::{Map, Value};
use tracing::debug;

use super::arcgis::{self, SpatialReference};
use super::types::{Feature, FeatureCollection, Geometry, GEOMETRY_TYPES};

/// Nesting limit for bare arrays. Deeper elements are dropped.
const MAX_NESTING: usize = 32;

/// Convert any payload into a feature collection.
///
/// Accepted shapes, detected by inspecting `type`, `features`, `geometry`,
/// `attributes` and coordinate members:
///
/// - GeoJSON `FeatureCollection`, `Feature` or bare geometry
/// - arrays of any of these, nested to any reasonable depth
/// - ArcGIS feature sets (`{features: [...]}`) with Esri features or
///   Esri geometries as elements
///
/// Unrecognized elements and features with malformed geometry are dropped.
/// This function never fails; the worst case is an empty collection.
pub fn normalize(raw: &Value) -> FeatureCollection {
    let mut out = Collector::default();
    out.collect(raw, SpatialReference::default(), 0);

    if out.dropped > 0 {
        debug!(
            kept = out.features.len(),
            dropped = out.dropped,
            "Dropped unrecognized elements during normalization"
        );
    }

    FeatureCollection::new(out.features)
}

/// Parse a GeoJSON geometry object, rejecting malformed coordinates.
pub(crate) fn parse_geojson_geometry(object: &Map<String, Value>) -> Option<Geometry> {
    let kind = object.get("type")?.as_str()?;
    if !GEOMETRY_TYPES.contains(&kind) {
        return None;
    }
    serde_json::from_value::<Geometry>(Value::Object(object.clone()))
        .ok()
        .filter(Geometry::is_well_formed)
}

#[derive(Default)]
struct Collector {
    features: Vec<Feature>,
    dropped: usize,
}

impl Collector {
    fn collect(&mut self, value: &Value, sr: SpatialReference, depth: usize) {
        if depth > MAX_NESTING {
            self.dropped += 1;
            return;
        }

        match value {
            Value::Array(items) => {
                for item in items {
                    self.collect(item, sr, depth + 1);
                }
            }
            Value::Object(object) => self.collect_object(object, sr, depth),
            _ => self.dropped += 1,
        }
    }

    fn collect_object(&mut self, object: &Map<String, Value>, sr: SpatialReference, depth: usize) {
        // FeatureCollection or ArcGIS feature set: flatten the elements.
        if let Some(items) = object.get("features").and_then(Value::as_array) {
            let sr = SpatialReference::detect(object).unwrap_or(sr);
            for item in items {
                self.collect(item, sr, depth + 1);
            }
            return;
        }

        let converted = match object.get("type").and_then(Value::as_str) {
            Some("Feature") => geojson_feature(object, sr),
            Some(kind) if GEOMETRY_TYPES.contains(&kind) => {
                parse_geojson_geometry(object).map(Feature::from_geometry)
            }
            _ if arcgis::is_esri_feature(object) => arcgis::feature_to_geojson(object, sr),
            _ if arcgis::is_esri_geometry(object) => {
                arcgis::geometry_to_geojson(object, sr).map(Feature::from_geometry)
            }
            _ => None,
        };

        match converted {
            Some(feature) => self.features.push(feature),
            None => self.dropped += 1,
        }
    }
}

fn geojson_feature(object: &Map<String, Value>, sr: SpatialReference) -> Option<Feature> {
    let geometry = match object.get("geometry") {
        None | Some(Value::Null) => None,
        Some(Value::Object(g)) => {
            Some(parse_geojson_geometry(g).or_else(|| arcgis::geometry_to_geojson(g, sr))?)
        }
        Some(_) => return None,
    };

    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let id = object
        .get("id")
        .filter(|v| v.is_string() || v.is_number())
        .cloned();

    Some(Feature {
        id,
        geometry,
        properties,
    })
}
