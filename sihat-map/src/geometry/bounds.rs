//! Bounding boxes and simple planar containment tests.

use super::types::{FeatureCollection, Geometry, LngLat, Position};

/// Axis-aligned bounding rectangle in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds covering a single position.
    pub fn from_position(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grow the bounds to include a position.
    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// South-west and north-east corners.
    pub fn corners(&self) -> (LngLat, LngLat) {
        (
            LngLat::new(self.min_x, self.min_y),
            LngLat::new(self.max_x, self.max_y),
        )
    }

    /// Centre of the rectangle.
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, point: LngLat) -> bool {
        point.lng >= self.min_x
            && point.lng <= self.max_x
            && point.lat >= self.min_y
            && point.lat <= self.max_y
    }
}

fn accumulate(bounds: &mut Option<Bounds>, position: &Position) {
    if position.len() < 2 || !position[0].is_finite() || !position[1].is_finite() {
        return;
    }
    let (x, y) = (position[0], position[1]);
    match bounds {
        Some(b) => b.extend(x, y),
        None => *bounds = Some(Bounds::from_position(x, y)),
    }
}

impl Geometry {
    /// Bounds of every coordinate in the geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = None;
        self.for_each_position(&mut |p| accumulate(&mut bounds, p));
        bounds
    }
}

impl FeatureCollection {
    /// Min/max over all coordinate tuples, skipping features without geometry.
    ///
    /// Returns `None` when no feature contributes a coordinate.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = None;
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            geometry.for_each_position(&mut |p| accumulate(&mut bounds, p));
        }
        bounds
    }
}

/// Ray-casting point-in-ring test. The ring may be open or closed.
pub fn ring_contains(ring: &[Position], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (Some(&xi), Some(&yi)) = (ring[i].first(), ring[i].get(1)) else {
            return false;
        };
        let (Some(&xj), Some(&yj)) = (ring[j].first(), ring[j].get(1)) else {
            return false;
        };
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether a polygon (outer ring plus holes) contains the point.
pub fn polygon_contains(rings: &[Vec<Position>], x: f64, y: f64) -> bool {
    match rings.split_first() {
        Some((outer, holes)) => {
            ring_contains(outer, x, y) && !holes.iter().any(|h| ring_contains(h, x, y))
        }
        None => false,
    }
}
