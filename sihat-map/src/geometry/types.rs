//! Canonical feature types produced by normalization.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A coordinate tuple: `[x, y]` or `[x, y, z]`, longitude first.
pub type Position = Vec<f64>;

/// Flat property bag attached to a feature.
pub type Properties = Map<String, Value>;

/// A geographic longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
}

impl LngLat {
    /// Create a new longitude/latitude pair.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// GeoJSON geometry, tagged on the `type` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

/// Geometry type names accepted as a GeoJSON `type` discriminator.
pub(crate) const GEOMETRY_TYPES: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

impl Geometry {
    /// Returns the GeoJSON type name of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Calls `visit` for every coordinate tuple, recursing into collections.
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Position)) {
        match self {
            Geometry::Point { coordinates } => visit(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().for_each(|p| visit(p));
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(|p| visit(p));
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(|p| visit(p));
            }
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.for_each_position(visit);
                }
            }
        }
    }

    /// Every position must carry at least two finite numbers.
    pub fn is_well_formed(&self) -> bool {
        let mut ok = true;
        self.for_each_position(&mut |p| {
            if p.len() < 2 || !p[0].is_finite() || !p[1].is_finite() {
                ok = false;
            }
        });
        ok
    }
}

/// A geometry paired with its properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    /// Optional feature identifier (string or number)
    pub id: Option<Value>,
    /// Geometry; `None` for features without a location
    pub geometry: Option<Geometry>,
    /// Property bag
    pub properties: Properties,
}

impl Feature {
    /// Create a feature with the given geometry and no properties.
    pub fn from_geometry(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    /// Attach properties to the feature.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Attach an identifier to the feature.
    pub fn with_id(mut self, id: Value) -> Self {
        self.id = Some(id);
        self
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("type", "Feature")?;
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        map.serialize_entry("geometry", &self.geometry)?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// A set of features. Immutable once cached; shared through `Arc`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a collection from features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Serialize to a GeoJSON value.
    pub fn to_value(&self) -> Value {
        // Serializing plain maps, vectors and finite floats cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "FeatureCollection")?;
        map.serialize_entry("features", &self.features)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geometry_deserializes_from_tagged_json() {
        let geometry: Geometry =
            serde_json::from_value(json!({"type": "Point", "coordinates": [114.8, -3.4]}))
                .unwrap();
        assert_eq!(
            geometry,
            Geometry::Point {
                coordinates: vec![114.8, -3.4]
            }
        );
        assert_eq!(geometry.type_name(), "Point");
    }

    #[test]
    fn test_geometry_rejects_unknown_type() {
        let result: Result<Geometry, _> =
            serde_json::from_value(json!({"type": "Circle", "coordinates": [0, 0]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_short_position_is_not_well_formed() {
        let geometry = Geometry::LineString {
            coordinates: vec![vec![1.0, 2.0], vec![3.0]],
        };
        assert!(!geometry.is_well_formed());
    }

    #[test]
    fn test_feature_serializes_type_member() {
        let feature = Feature::from_geometry(Geometry::Point {
            coordinates: vec![1.0, 2.0],
        })
        .with_id(json!(7));
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["id"], 7);
        assert_eq!(value["geometry"]["type"], "Point");
        assert!(value["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_empty_collection_serializes() {
        let value = FeatureCollection::empty().to_value();
        assert_eq!(value, json!({"type": "FeatureCollection", "features": []}));
    }
}
