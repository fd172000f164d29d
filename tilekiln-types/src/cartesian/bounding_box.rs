use approx::AbsDiffEq;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Axis-aligned rectangle. In this crate it holds Web Mercator meters unless stated otherwise,
/// so `x` is the "longitude" axis and `y` the "latitude" axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl BoundingBox {
    /// Creates a new box. The caller is responsible for `min <= max` on both axes.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a box from its lower-left and upper-right corners.
    pub fn from_corners(lower_left: Point2<f64>, upper_right: Point2<f64>) -> Self {
        Self::new(lower_left.x, lower_left.y, upper_right.x, upper_right.y)
    }

    /// Parses `[x_min, y_min, x_max, y_max]`, the layout used by layer extent configuration.
    pub fn from_bounds(bounds: &[f64]) -> Result<Self, TypesError> {
        let [x_min, y_min, x_max, y_max] = bounds else {
            return Err(TypesError::BoundsLength(bounds.len()));
        };

        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(TypesError::NonFinite);
        }

        Ok(Self::new(*x_min, *y_min, *x_max, *y_max))
    }

    /// Minimum x (west edge).
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Maximum x (east edge).
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Minimum y (south edge).
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Maximum y (north edge).
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Lower-left corner.
    pub fn lower_left(&self) -> Point2<f64> {
        Point2::new(self.x_min, self.y_min)
    }

    /// Upper-right corner.
    pub fn upper_right(&self) -> Point2<f64> {
        Point2::new(self.x_max, self.y_max)
    }

    /// Center of the box.
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Grows the box by `amount` on every side. Negative values shrink it.
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            x_min: self.x_min - amount,
            x_max: self.x_max + amount,
            y_min: self.y_min - amount,
            y_max: self.y_max + amount,
        }
    }

    /// Clamps every edge independently into `[-limit, limit]`.
    pub fn clamp_to(&self, limit: f64) -> Self {
        Self {
            x_min: self.x_min.max(-limit),
            x_max: self.x_max.min(limit),
            y_min: self.y_min.max(-limit),
            y_max: self.y_max.min(limit),
        }
    }

    /// Overlap test. Boxes that only touch along an edge or a corner intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.x_min > other.x_max
            || self.x_max < other.x_min
            || self.y_max < other.y_min
            || self.y_min > other.y_max)
    }

    /// Returns true if the point is inside the box or on its boundary.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }
}

impl AbsDiffEq for BoundingBox {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x_min.abs_diff_eq(&other.x_min, epsilon)
            && self.y_min.abs_diff_eq(&other.y_min, epsilon)
            && self.x_max.abs_diff_eq(&other.x_max, epsilon)
            && self.y_max.abs_diff_eq(&other.y_max, epsilon)
    }
}
