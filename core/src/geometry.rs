//! Geometry primitives shared by the spatial index and collision resolution.
//!
//! Only two intersection tests are required by the engine: swept-circle
//! collision reduces to a segment-vs-circle quadratic, and the spatial grid's
//! superset query reduces to circle-vs-rectangle overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle bounding all simulation positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    /// Creates bounds from opposite corners. Coordinates are normalised so
    /// `min` is component-wise below `max`.
    #[must_use]
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Width of the bounded region.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the bounded region.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Reports whether the point lies inside the bounds (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Tests whether the segment from `a` to `b` passes within `radius` of
/// `center`.
///
/// Closed-form quadratic on the parametrised segment `a + t(b − a)`,
/// `t ∈ [0, 1]`. Degenerate segments fall back to a point-distance check so
/// stationary projectiles still register contact hits.
#[must_use]
pub fn segment_circle_intersects(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    let d = b - a;
    let f = a - center;

    let a_coef = d.dot(d);
    if a_coef <= f32::EPSILON {
        return f.length_squared() <= radius * radius;
    }

    let b_coef = 2.0 * f.dot(d);
    let c_coef = f.dot(f) - radius * radius;

    let discriminant = b_coef * b_coef - 4.0 * a_coef * c_coef;
    if discriminant < 0.0 {
        return false;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b_coef - sqrt_disc) / (2.0 * a_coef);
    let t2 = (-b_coef + sqrt_disc) / (2.0 * a_coef);

    // The circle is hit if either root lies on the segment, or the segment
    // starts and ends inside the circle (t1 < 0 < 1 < t2).
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2) || (t1 < 0.0 && t2 > 1.0)
}

/// Reports whether a circle overlaps an axis-aligned rectangle.
#[must_use]
pub fn circle_rect_overlaps(center: Vec2, radius: f32, rect_min: Vec2, rect_max: Vec2) -> bool {
    let closest = center.clamp(rect_min, rect_max);
    (center - closest).length_squared() <= radius * radius
}
