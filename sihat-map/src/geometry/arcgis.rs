//! Esri JSON (ArcGIS REST) to GeoJSON conversion.
//!
//! Handles the geometry shapes the ArcGIS feature service emits:
//!
//! | Esri member | GeoJSON result                     |
//! |-------------|------------------------------------|
//! | `x`, `y`    | `Point`                            |
//! | `points`    | `MultiPoint`                       |
//! | `paths`     | `LineString` / `MultiLineString`   |
//! | `rings`     | `Polygon` / `MultiPolygon`         |
//!
//! Rings follow the Esri winding rule: clockwise rings are exteriors,
//! counter-clockwise rings are holes. Output rings use the GeoJSON rule
//! (exteriors counter-clockwise).

use serde_json::{Map, Value};

use super::bounds::ring_contains;
use super::types::{Feature, Geometry, Position, Properties};

/// Earth radius used by the Web Mercator (EPSG:3857) projection.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Well-known ids that denote Web Mercator.
const WEB_MERCATOR_WKIDS: [i64; 3] = [102100, 102113, 3857];

/// Attribute names that carry the feature identifier, in lookup order.
const ID_ATTRIBUTES: [&str; 2] = ["OBJECTID", "FID"];

/// Spatial reference of Esri coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialReference {
    /// Longitude/latitude degrees (WGS84); coordinates pass through
    #[default]
    Geographic,
    /// Web Mercator metres; coordinates are unprojected
    WebMercator,
}

impl SpatialReference {
    /// Read `spatialReference.wkid` (or `latestWkid`) from an Esri object.
    pub fn detect(object: &Map<String, Value>) -> Option<Self> {
        let sr = object.get("spatialReference")?.as_object()?;
        let wkid = sr
            .get("latestWkid")
            .and_then(Value::as_i64)
            .or_else(|| sr.get("wkid").and_then(Value::as_i64))?;
        if WEB_MERCATOR_WKIDS.contains(&wkid) {
            Some(SpatialReference::WebMercator)
        } else {
            Some(SpatialReference::Geographic)
        }
    }

    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            SpatialReference::Geographic => (x, y),
            SpatialReference::WebMercator => {
                let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
                let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                (lon, lat)
            }
        }
    }
}

/// Whether the object looks like an Esri geometry.
pub fn is_esri_geometry(object: &Map<String, Value>) -> bool {
    (object.contains_key("x") && object.contains_key("y"))
        || object.contains_key("points")
        || object.contains_key("paths")
        || object.contains_key("rings")
}

/// Whether the object looks like an Esri feature (`geometry` + `attributes`).
pub fn is_esri_feature(object: &Map<String, Value>) -> bool {
    object.contains_key("attributes")
        || (object.contains_key("geometry") && !object.contains_key("type"))
}

/// Convert an Esri geometry object. Returns `None` for anything malformed.
pub fn geometry_to_geojson(
    object: &Map<String, Value>,
    inherited: SpatialReference,
) -> Option<Geometry> {
    let sr = SpatialReference::detect(object).unwrap_or(inherited);

    if let (Some(x), Some(y)) = (object.get("x"), object.get("y")) {
        let (x, y) = sr.apply(x.as_f64()?, y.as_f64()?);
        return finite_point(x, y).map(|coordinates| Geometry::Point { coordinates });
    }

    if let Some(points) = object.get("points") {
        let coordinates = positions(points, sr)?;
        if coordinates.is_empty() {
            return None;
        }
        return Some(Geometry::MultiPoint { coordinates });
    }

    if let Some(paths) = object.get("paths") {
        let mut lines = paths
            .as_array()?
            .iter()
            .map(|path| positions(path, sr))
            .collect::<Option<Vec<_>>>()?;
        lines.retain(|line| line.len() >= 2);
        return match lines.len() {
            0 => None,
            1 => lines.pop().map(|coordinates| Geometry::LineString { coordinates }),
            _ => Some(Geometry::MultiLineString { coordinates: lines }),
        };
    }

    if let Some(rings) = object.get("rings") {
        let rings = rings
            .as_array()?
            .iter()
            .map(|ring| positions(ring, sr))
            .collect::<Option<Vec<_>>>()?;
        return rings_to_geojson(rings);
    }

    None
}

/// Convert an Esri feature (`{geometry, attributes}`).
///
/// The geometry may itself already be GeoJSON; both shapes are accepted.
/// Returns `None` when a geometry is present but cannot be converted.
pub fn feature_to_geojson(
    object: &Map<String, Value>,
    inherited: SpatialReference,
) -> Option<Feature> {
    let properties: Properties = object
        .get("attributes")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let geometry = match object.get("geometry") {
        None | Some(Value::Null) => None,
        Some(Value::Object(g)) => Some(
            super::normalize::parse_geojson_geometry(g)
                .or_else(|| geometry_to_geojson(g, inherited))?,
        ),
        Some(_) => return None,
    };

    let id = ID_ATTRIBUTES
        .iter()
        .find_map(|key| properties.get(*key))
        .filter(|v| v.is_number() || v.is_string())
        .cloned();

    Some(Feature {
        id,
        geometry,
        properties,
    })
}

fn finite_point(x: f64, y: f64) -> Option<Position> {
    (x.is_finite() && y.is_finite()).then(|| vec![x, y])
}

/// Parse `[[x, y, ...], ...]`, applying the spatial reference.
fn positions(value: &Value, sr: SpatialReference) -> Option<Vec<Position>> {
    value
        .as_array()?
        .iter()
        .map(|p| {
            let tuple = p.as_array()?;
            let x = tuple.first()?.as_f64()?;
            let y = tuple.get(1)?.as_f64()?;
            let (x, y) = sr.apply(x, y);
            let mut position = finite_point(x, y)?;
            if let Some(z) = tuple.get(2).and_then(Value::as_f64) {
                position.push(z);
            }
            Some(position)
        })
        .collect()
}

fn close_ring(mut ring: Vec<Position>) -> Vec<Position> {
    let open = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first[..2] != last[..2],
        _ => false,
    };
    if open {
        let first = ring[0].clone();
        ring.push(first);
    }
    ring
}

/// Shoelace sum; non-negative means clockwise in a y-up plane.
pub(crate) fn ring_is_clockwise(ring: &[Position]) -> bool {
    let total: f64 = ring
        .windows(2)
        .map(|w| (w[1][0] - w[0][0]) * (w[1][1] + w[0][1]))
        .sum();
    total >= 0.0
}

fn rings_to_geojson(rings: Vec<Vec<Position>>) -> Option<Geometry> {
    let mut outers: Vec<Vec<Vec<Position>>> = Vec::new();
    let mut holes: Vec<Vec<Position>> = Vec::new();

    for ring in rings {
        let mut ring = close_ring(ring);
        if ring.len() < 4 {
            continue;
        }
        ring.reverse();
        if ring_is_clockwise(&ring) {
            // Reversed orientation: this was counter-clockwise, a hole.
            holes.push(ring);
        } else {
            outers.push(vec![ring]);
        }
    }

    for hole in holes {
        let sample = (hole[0][0], hole[0][1]);
        let owner = outers
            .iter_mut()
            .rev()
            .find(|polygon| ring_contains(&polygon[0], sample.0, sample.1));
        match owner {
            Some(polygon) => polygon.push(hole),
            None => {
                let mut promoted = hole;
                promoted.reverse();
                outers.push(vec![promoted]);
            }
        }
    }

    match outers.len() {
        0 => None,
        1 => outers.pop().map(|coordinates| Geometry::Polygon { coordinates }),
        _ => Some(Geometry::MultiPolygon {
            coordinates: outers,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_point_conversion() {
        let g = geometry_to_geojson(&obj(json!({"x": 114.83, "y": -3.44})), Default::default());
        assert_eq!(
            g,
            Some(Geometry::Point {
                coordinates: vec![114.83, -3.44]
            })
        );
    }

    #[test]
    fn test_non_numeric_point_is_rejected() {
        let g = geometry_to_geojson(&obj(json!({"x": "NaN", "y": 1})), Default::default());
        assert!(g.is_none());
    }

    #[test]
    fn test_single_path_becomes_line_string() {
        let g = geometry_to_geojson(
            &obj(json!({"paths": [[[0, 0], [1, 1], [2, 1]]]})),
            Default::default(),
        )
        .unwrap();
        assert_eq!(g.type_name(), "LineString");
    }

    #[test]
    fn test_multiple_paths_become_multi_line_string() {
        let g = geometry_to_geojson(
            &obj(json!({"paths": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]})),
            Default::default(),
        )
        .unwrap();
        assert_eq!(g.type_name(), "MultiLineString");
    }

    #[test]
    fn test_clockwise_ring_with_hole_becomes_polygon() {
        // Esri: exterior clockwise, hole counter-clockwise.
        let esri = json!({
            "rings": [
                [[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]],
                [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
            ]
        });
        let g = geometry_to_geojson(&obj(esri), Default::default()).unwrap();
        match g {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 2);
                assert!(!ring_is_clockwise(&coordinates[0]), "exterior must be CCW");
                assert!(ring_is_clockwise(&coordinates[1]), "hole must be CW");
            }
            other => panic!("expected polygon, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_two_exteriors_become_multi_polygon() {
        let esri = json!({
            "rings": [
                [[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]],
                [[5, 5], [5, 6], [6, 6], [6, 5], [5, 5]]
            ]
        });
        let g = geometry_to_geojson(&obj(esri), Default::default()).unwrap();
        assert_eq!(g.type_name(), "MultiPolygon");
    }

    #[test]
    fn test_open_ring_is_closed_and_degenerate_ring_dropped() {
        let esri = json!({
            "rings": [
                [[0, 0], [0, 10], [10, 10], [10, 0]],
                [[1, 1], [2, 2]]
            ]
        });
        match geometry_to_geojson(&obj(esri), Default::default()).unwrap() {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 5);
                assert_eq!(coordinates[0].first(), coordinates[0].last());
            }
            other => panic!("expected polygon, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_web_mercator_is_unprojected() {
        let esri = json!({
            "x": 12783331.0,
            "y": -383202.0,
            "spatialReference": {"wkid": 102100}
        });
        match geometry_to_geojson(&obj(esri), Default::default()).unwrap() {
            Geometry::Point { coordinates } => {
                assert!((coordinates[0] - 114.83).abs() < 0.01);
                assert!((coordinates[1] - (-3.44)).abs() < 0.01);
            }
            other => panic!("expected point, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_feature_takes_attributes_and_object_id() {
        let esri = json!({
            "attributes": {"OBJECTID": 12, "namobj": "RSD Idaman"},
            "geometry": {"x": 114.8, "y": -3.4}
        });
        let feature = feature_to_geojson(&obj(esri), Default::default()).unwrap();
        assert_eq!(feature.id, Some(json!(12)));
        assert_eq!(feature.properties["namobj"], "RSD Idaman");
        assert!(feature.geometry.is_some());
    }

    #[test]
    fn test_feature_without_geometry_is_kept() {
        let feature =
            feature_to_geojson(&obj(json!({"attributes": {"a": 1}})), Default::default())
                .unwrap();
        assert!(feature.geometry.is_none());
    }

    #[test]
    fn test_feature_with_broken_geometry_is_rejected() {
        let esri = json!({"attributes": {}, "geometry": {"rings": "nope"}});
        assert!(feature_to_geojson(&obj(esri), Default::default()).is_none());
    }
}
