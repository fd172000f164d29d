//! Geometries in projected (cartesian) coordinates.

mod bounding_box;

pub use bounding_box::BoundingBox;
pub use nalgebra::Point2;

/// 2d point with `f64` coordinates.
pub type Point2d = Point2<f64>;

/// A point in Web Mercator (EPSG:3857) meters.
pub type MercatorPoint = Point2d;
