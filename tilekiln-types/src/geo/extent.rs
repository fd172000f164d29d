use serde::{Deserialize, Serialize};

use crate::cartesian::BoundingBox;
use crate::error::TypesError;
use crate::geo::point::GeoPoint2d;

/// Geographic region of interest given by its lower-left and upper-right corners.
///
/// No ordering is enforced between the corners: extent math downstream is expected to cope with
/// malformed extents on its own terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// South-west corner.
    pub lower_left: GeoPoint2d,
    /// North-east corner.
    pub upper_right: GeoPoint2d,
}

impl Extent {
    /// The whole world, `[-180, -90, 180, 90]`.
    pub const WORLD: Extent = Extent {
        lower_left: GeoPoint2d::lonlat(-180.0, -90.0),
        upper_right: GeoPoint2d::lonlat(180.0, 90.0),
    };

    /// Creates an extent from its corners.
    pub fn new(lower_left: GeoPoint2d, upper_right: GeoPoint2d) -> Self {
        Self {
            lower_left,
            upper_right,
        }
    }

    /// Parses `[min_lon, min_lat, max_lon, max_lat]`.
    pub fn from_bounds(bounds: &[f64]) -> Result<Self, TypesError> {
        let bbox = BoundingBox::from_bounds(bounds)?;
        Ok(Self::new(
            GeoPoint2d::lonlat(bbox.x_min(), bbox.y_min()),
            GeoPoint2d::lonlat(bbox.x_max(), bbox.y_max()),
        ))
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.upper_right.lon() - self.lower_left.lon()
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.upper_right.lat() - self.lower_left.lat()
    }

    /// The extent as a box in degrees.
    pub fn to_bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.lower_left.lon(),
            self.lower_left.lat(),
            self.upper_right.lon(),
            self.upper_right.lat(),
        )
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::WORLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounds() {
        let extent = Extent::from_bounds(&[-10.0, -5.0, 20.0, 15.0]).unwrap();
        assert_eq!(extent.lower_left, GeoPoint2d::lonlat(-10.0, -5.0));
        assert_eq!(extent.upper_right, GeoPoint2d::lonlat(20.0, 15.0));
        assert_eq!(extent.width(), 30.0);
        assert_eq!(extent.height(), 20.0);
    }

    #[test]
    fn default_is_world() {
        assert_eq!(Extent::default(), Extent::WORLD);
        assert_eq!(Extent::WORLD.to_bbox().width(), 360.0);
    }
}
