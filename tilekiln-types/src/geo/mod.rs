//! Geographic coordinates (longitude and latitude in degrees, WGS84) and their projection into
//! Web Mercator meters and tile-pixel space.

mod datum;
mod extent;
mod point;
mod web_mercator;

pub use datum::Datum;
pub use extent::Extent;
pub use point::GeoPoint2d;
pub use web_mercator::{
    geo_to_pixel, pixel_to_geo, WebMercator, MAX_MERCATOR_LATITUDE, WEB_MERCATOR_HALF_WORLD_WIDTH,
};
