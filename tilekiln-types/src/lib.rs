//! Geographic (WGS84 longitude/latitude) and projected (Web Mercator meters) primitives used by
//! the `tilekiln` tile renderer.
//!
//! All projection math in the workspace goes through [`WebMercator`] so that bounding boxes
//! computed from geographic input reconcile exactly with the tile pyramid math.

pub mod cartesian;
pub mod error;
pub mod geo;

pub use cartesian::{BoundingBox, MercatorPoint, Point2, Point2d};
pub use geo::{
    geo_to_pixel, pixel_to_geo, Datum, Extent, GeoPoint2d, WebMercator, MAX_MERCATOR_LATITUDE,
    WEB_MERCATOR_HALF_WORLD_WIDTH,
};
