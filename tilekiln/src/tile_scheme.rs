//! Slippy-map tile pyramid math in Web Mercator.
//!
//! All functions here are pure: no I/O and no error returns. Out-of-world geographic input is
//! still projected, and every bounding box is clamped to the world before it is returned.

use serde::{Deserialize, Serialize};
use tilekiln_types::{
    BoundingBox, GeoPoint2d, Point2d, WebMercator, WEB_MERCATOR_HALF_WORLD_WIDTH,
};

/// Deepest zoom level scanned by [`smallest_tile_containing_extent`].
pub const MAX_EXTENT_SCAN_ZOOM: u32 = 18;

/// Length in pixels of the shorter side of images produced by [`image_dimensions_for_extent`].
pub const BASE_IMAGE_DIMENSION: u32 = 150;

/// Index of a tile in the standard pyramid. At zoom `z` both `x` and `y` are in `[0, 2^z)`,
/// with `y` growing southwards.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Zoom level.
    pub z: u32,
}

impl TileIndex {
    /// `(0, 0, 0)`, also returned by [`smallest_tile_containing_extent`] when it cannot decide.
    /// Treat it as "unknown" in that context, not as a real containment answer.
    pub const UNKNOWN: TileIndex = TileIndex::new(0, 0, 0);

    /// Creates a new index.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Returns true if `x` and `y` are inside the index space of the zoom level.
    pub fn is_valid(&self) -> bool {
        let side = tiles_per_side(self.z);
        (self.x as f64) < side && (self.y as f64) < side
    }

    /// Identifier used when requesting the tile payload: `"{z}-{x}-{y}"`.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.z, self.x, self.y)
    }

    /// Parses an identifier created by [`TileIndex::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.split('-').map(|part| part.trim().parse::<u32>());
        let z = parts.next()?.ok()?;
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self { x, y, z })
    }
}

/// Pixel buffer added around a tile bounding box, e.g. to render labels crossing tile edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBuffer {
    /// Buffer width in pixels.
    pub pixels: f64,
    /// Size of the tile in pixels, used to convert the buffer into meters.
    pub tile_size: f64,
}

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Number of tiles along one side of the pyramid at the zoom level: `2^zoom`.
pub fn tiles_per_side(zoom: u32) -> f64 {
    2f64.powi(zoom as i32)
}

/// Size of one tile side in meters.
pub fn tile_size_meters(tiles_per_side: f64) -> f64 {
    (2.0 * WEB_MERCATOR_HALF_WORLD_WIDTH) / tiles_per_side
}

/// Web Mercator bounding box of the tile.
///
/// With a `buffer` the box is grown by `pixels * tile_meters / tile_size` on every side. The
/// result is clamped to the world on every edge independently.
pub fn web_mercator_bbox(index: TileIndex, buffer: Option<TileBuffer>) -> BoundingBox {
    let half = WEB_MERCATOR_HALF_WORLD_WIDTH;
    let tile_size = tile_size_meters(tiles_per_side(index.z));

    let meter_buffer = match buffer {
        Some(TileBuffer { pixels, tile_size: tile_pixels }) if tile_pixels > 0.0 => {
            pixels * (tile_size / tile_pixels)
        }
        _ => 0.0,
    };

    let x = index.x as f64;
    let y = index.y as f64;

    BoundingBox::new(
        -half + x * tile_size,
        half - (y + 1.0) * tile_size,
        -half + (x + 1.0) * tile_size,
        half - y * tile_size,
    )
    .expand(meter_buffer)
    .clamp_to(half)
}

/// Image size preserving the aspect ratio of the extent (in degrees), with the shorter side
/// set to [`BASE_IMAGE_DIMENSION`].
///
/// Degenerate extents (zero height, non-finite or non-positive ratio) produce a square image.
pub fn image_dimensions_for_extent(lower_left: GeoPoint2d, upper_right: GeoPoint2d) -> ImageSize {
    let base = BASE_IMAGE_DIMENSION;
    let ratio = (upper_right.lon() - lower_left.lon()) / (upper_right.lat() - lower_left.lat());

    if !ratio.is_finite() || ratio <= 0.0 {
        return ImageSize {
            width: base,
            height: base,
        };
    }

    if ratio > 1.0 {
        ImageSize {
            width: (base as f64 * ratio).ceil() as u32,
            height: base,
        }
    } else {
        ImageSize {
            width: base,
            height: (base as f64 / ratio).ceil() as u32,
        }
    }
}

/// Finds a representative tile covering the extent.
///
/// Zoom levels `0..=18` are scanned upwards. At the first level where the extent spans at least
/// two tiles past the first one on either axis, the tile `(min_x + 1, min_y + 1)` of that level
/// is returned. If no level triggers, the indices from level 18 are returned. Non-finite input
/// returns [`TileIndex::UNKNOWN`]. Indices of extents reaching past the world edges are clamped
/// into the pyramid.
pub fn smallest_tile_containing_extent(
    lower_left: GeoPoint2d,
    upper_right: GeoPoint2d,
) -> TileIndex {
    if !lower_left.is_finite() || !upper_right.is_finite() {
        return TileIndex::UNKNOWN;
    }

    let half = WEB_MERCATOR_HALF_WORLD_WIDTH;
    let ll = WebMercator::WGS84.project(&lower_left);
    let ur = WebMercator::WGS84.project(&upper_right);

    let mut x = 0.0;
    let mut y = 0.0;
    for z in 0..=MAX_EXTENT_SCAN_ZOOM {
        let tile_size = tile_size_meters(tiles_per_side(z));

        let min_x = ((ll.x + half) / tile_size).floor();
        let max_x = (((ur.x + half) / tile_size) - 1.0).floor().max(0.0);
        let max_y = (((half - ll.y) / tile_size) - 1.0).ceil().max(0.0);
        let min_y = ((half - ur.y) / tile_size).floor();

        let x_split = min_x < max_x && max_x - min_x >= 2.0;
        let y_split = min_y != max_y && max_y - min_y >= 2.0;
        if x_split || y_split {
            return tile_index_from_f64(min_x + 1.0, min_y + 1.0, z);
        }

        x = min_x;
        y = min_y;
    }

    tile_index_from_f64(x, y, MAX_EXTENT_SCAN_ZOOM)
}

fn tile_index_from_f64(x: f64, y: f64, z: u32) -> TileIndex {
    if !x.is_finite() || !y.is_finite() {
        log::debug!("Extent scan produced non-finite tile ({x}, {y}, {z})");
        return TileIndex::UNKNOWN;
    }

    let last = tiles_per_side(z) - 1.0;
    if x < 0.0 || y < 0.0 || x > last || y > last {
        log::debug!("Extent scan tile ({x}, {y}, {z}) is outside of the world, clamping");
    }

    TileIndex::new(x.clamp(0.0, last) as u32, y.clamp(0.0, last) as u32, z)
}

/// Axis-aligned overlap test of box A and box B given by their upper-right and lower-left
/// corners. Touching edges count as intersecting.
pub fn boxes_intersect(
    a_upper_right: Point2d,
    a_lower_left: Point2d,
    b_upper_right: Point2d,
    b_lower_left: Point2d,
) -> bool {
    BoundingBox::from_corners(a_lower_left, a_upper_right)
        .intersects(&BoundingBox::from_corners(b_lower_left, b_upper_right))
}
