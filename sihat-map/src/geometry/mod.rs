//! Geometry normalization.
//!
//! Converts the heterogeneous payloads served by the municipal geoportal
//! (GeoJSON in several shapes, ArcGIS feature sets, bare arrays) into one
//! canonical [`FeatureCollection`].
//!
//! ```
//! use serde_json::json;
//! use sihat_map::geometry::normalize;
//!
//! let fc = normalize(&json!({"x": 114.83, "y": -3.44}));
//! assert_eq!(fc.len(), 1);
//!
//! // Anything unrecognized degrades to an empty collection.
//! assert!(normalize(&json!("not geojson")).is_empty());
//! ```

pub mod arcgis;
mod bounds;
mod normalize;
mod types;

pub use bounds::{polygon_contains, ring_contains, Bounds};
pub use normalize::normalize;
pub use types::{Feature, FeatureCollection, Geometry, LngLat, Position, Properties};
