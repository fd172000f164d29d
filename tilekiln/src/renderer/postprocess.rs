//! Conversion of raw rendered pixels into the requested output.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};

use crate::error::TilekilnError;
use crate::render::RawImage;

/// Resizes the image to the target size. Images that already have it are returned as is.
pub fn fit(raw: RawImage, width: u32, height: u32) -> Result<RawImage, TilekilnError> {
    if raw.width == width && raw.height == height {
        return Ok(raw);
    }

    log::trace!(
        "Resizing rendered image from {}x{} to {width}x{height}",
        raw.width,
        raw.height
    );

    let image = to_rgba_image(raw)?;
    let resized = image::imageops::resize(&image, width, height, FilterType::Lanczos3);

    Ok(RawImage {
        width,
        height,
        data: resized.into_raw(),
    })
}

/// Encodes the image as PNG.
pub fn encode_png(raw: RawImage) -> Result<Bytes, TilekilnError> {
    let image = DynamicImage::ImageRgba8(to_rgba_image(raw)?);
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;

    Ok(Bytes::from(buffer.into_inner()))
}

fn to_rgba_image(raw: RawImage) -> Result<RgbaImage, TilekilnError> {
    let RawImage {
        width,
        height,
        data,
    } = raw;
    RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        TilekilnError::Render(format!(
            "rendered buffer does not match image size {width}x{height}"
        ))
    })
}
