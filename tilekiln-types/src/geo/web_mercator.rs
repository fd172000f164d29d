use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::cartesian::MercatorPoint;
use crate::geo::datum::Datum;
use crate::geo::point::GeoPoint2d;

/// Latitudes are clamped to this value (in degrees) before projecting, so the poles never turn
/// into infinities.
pub const MAX_MERCATOR_LATITUDE: f64 = 89.9999;

/// Projected x of the 180° meridian, i.e. half of the world width in Web Mercator meters.
///
/// Computed the same way [`WebMercator::project`] computes `x`, so both agree bit for bit.
pub const WEB_MERCATOR_HALF_WORLD_WIDTH: f64 = Datum::WGS84.semimajor() * (180.0 * (PI / 180.0));

/// Spherical Web Mercator projection (EPSG:4326 → EPSG:3857).
///
/// The sphere radius is the semimajor axis of the datum, 6378137 m for WGS84. Every conversion in
/// the workspace uses the WGS84 instance, which keeps tile bounding boxes and projected extents
/// consistent with each other.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Projection over the WGS84 sphere.
    pub const WGS84: WebMercator = WebMercator {
        datum: Datum::WGS84,
    };

    /// Creates a projection for the given datum.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }

    /// Half of the world width for this projection's sphere.
    pub fn half_world_width(&self) -> f64 {
        self.datum.semimajor() * 180f64.to_radians()
    }

    /// Projects a geographic point into meters.
    ///
    /// Longitude is not range checked: values outside of `±180` are projected linearly.
    pub fn project(&self, point: &GeoPoint2d) -> MercatorPoint {
        let radius = self.datum.semimajor();
        let lat = point
            .lat()
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();

        let x = radius * point.lon_rad();
        let y = radius * (FRAC_PI_4 + lat / 2.0).tan().ln();

        MercatorPoint::new(x, y)
    }

    /// Inverse of [`WebMercator::project`].
    pub fn unproject(&self, point: &MercatorPoint) -> GeoPoint2d {
        let radius = self.datum.semimajor();
        let lat = FRAC_PI_2 - 2.0 * (-point.y / radius).exp().atan();
        let lon = point.x / radius;

        GeoPoint2d::lonlat(lon.to_degrees(), lat.to_degrees())
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Converts a position in world pixels into geographic coordinates.
///
/// At `zoom` the world is `tile_size * 2^zoom` pixels wide and high, with the origin in the
/// top-left (north-west) corner.
pub fn pixel_to_geo(px: f64, py: f64, zoom: u32, tile_size: u32) -> GeoPoint2d {
    let half = WEB_MERCATOR_HALF_WORLD_WIDTH;
    let world = world_size_px(zoom, tile_size);
    let merc = MercatorPoint::new(px / world * 2.0 * half - half, half - py / world * 2.0 * half);

    WebMercator::WGS84.unproject(&merc)
}

/// Converts geographic coordinates into world pixels. Inverse of [`pixel_to_geo`].
pub fn geo_to_pixel(point: &GeoPoint2d, zoom: u32, tile_size: u32) -> (f64, f64) {
    let half = WEB_MERCATOR_HALF_WORLD_WIDTH;
    let world = world_size_px(zoom, tile_size);
    let merc = WebMercator::WGS84.project(point);

    (
        (merc.x + half) / (2.0 * half) * world,
        (half - merc.y) / (2.0 * half) * world,
    )
}

fn world_size_px(zoom: u32, tile_size: u32) -> f64 {
    tile_size as f64 * 2f64.powi(zoom as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn half_world_width_matches_antimeridian() {
        let projected = WebMercator::WGS84.project(&GeoPoint2d::lonlat(180.0, 0.0));
        assert_eq!(projected.x, WEB_MERCATOR_HALF_WORLD_WIDTH);
        assert_abs_diff_eq!(WEB_MERCATOR_HALF_WORLD_WIDTH, 20037508.342789244, epsilon = 1e-6);
        assert_eq!(
            WebMercator::WGS84.half_world_width(),
            WEB_MERCATOR_HALF_WORLD_WIDTH
        );
    }

    #[test]
    fn project_known_point() {
        let projected = WebMercator::WGS84.project(&GeoPoint2d::lonlat(10.0, 45.0));
        assert_abs_diff_eq!(projected.x, 1113194.9079327357, epsilon = 1e-6);
        assert_abs_diff_eq!(projected.y, 5621521.486192066, epsilon = 1e-3);
    }

    #[test]
    fn round_trip() {
        let projection = WebMercator::default();
        for lon in [-179.9, -45.0, 0.0, 0.5, 33.3, 179.9] {
            for lat in [-89.8, -60.0, -1.0, 0.0, 12.5, 85.0, 89.8] {
                let point = GeoPoint2d::lonlat(lon, lat);
                let back = projection.unproject(&projection.project(&point));
                assert_abs_diff_eq!(back, point, epsilon = 1e-8);

                let merc = projection.project(&point);
                let again = projection.project(&projection.unproject(&merc));
                assert_abs_diff_eq!(again, merc, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn poles_are_clamped() {
        let projection = WebMercator::WGS84;
        let north = projection.project(&GeoPoint2d::lonlat(0.0, 90.0));
        let south = projection.project(&GeoPoint2d::lonlat(0.0, -90.0));
        assert!(north.y.is_finite());
        assert!(south.y.is_finite());
        assert_relative_eq!(north.y, -south.y, max_relative = 1e-9);
        assert_eq!(
            north,
            projection.project(&GeoPoint2d::lonlat(0.0, MAX_MERCATOR_LATITUDE))
        );
    }

    #[test]
    fn pixel_conversions() {
        let center = pixel_to_geo(128.0, 128.0, 0, 256);
        assert_abs_diff_eq!(center, GeoPoint2d::lonlat(0.0, 0.0), epsilon = 1e-9);

        let corner = pixel_to_geo(0.0, 0.0, 0, 256);
        assert_abs_diff_eq!(corner.lon(), -180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(corner.lat(), 85.0511287798066, epsilon = 1e-9);

        let point = GeoPoint2d::lonlat(24.5, -33.1);
        let (px, py) = geo_to_pixel(&point, 5, 256);
        assert_abs_diff_eq!(pixel_to_geo(px, py, 5, 256), point, epsilon = 1e-9);
    }
}
