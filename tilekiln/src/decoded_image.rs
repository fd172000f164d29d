//! Raster icons referenced by style documents.

use std::path::PathBuf;

use bytes::Bytes;
use image::imageops::FilterType;

use crate::error::TilekilnError;

/// Size in pixels of icons loaded from files.
pub const FILE_ICON_SIZE: u32 = 16;

/// An image that has been loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    pub(crate) bytes: Vec<u8>,
    /// Width and height of the image.
    pub(crate) dimensions: (u32, u32),
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    pub fn new(bytes: &[u8]) -> Result<Self, TilekilnError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let dimensions = decoded.dimensions();

        Ok(Self {
            bytes: decoded.to_rgba8().into_vec(),
            dimensions,
        })
    }

    /// Wraps already decoded RGBA pixels.
    pub fn from_raw(bytes: Vec<u8>, width: u32, height: u32) -> Result<Self, TilekilnError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(TilekilnError::Generic(format!(
                "image data of {width}x{height} must have {expected} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    /// Decodes an image from data and resizes it to exactly `width` x `height`.
    pub fn new_resized(bytes: &[u8], width: u32, height: u32) -> Result<Self, TilekilnError> {
        let decoded = image::load_from_memory(bytes)?;
        let resized = decoded.resize_exact(width, height, FilterType::Lanczos3);

        Ok(Self {
            bytes: resized.to_rgba8().into_vec(),
            dimensions: (width, height),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// RGBA pixels, row by row.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Icon declared alongside a style document and registered under `id` at initialization.
#[derive(Debug, Clone)]
pub enum ImageAsset {
    /// Image file of any supported format, resized to [`FILE_ICON_SIZE`] pixels square.
    File {
        /// Id referenced by `icon-image` in the style.
        id: String,
        /// Path of the file.
        path: PathBuf,
    },
    /// Pre-decoded RGBA pixels.
    Data {
        /// Id referenced by `icon-image` in the style.
        id: String,
        /// RGBA pixels.
        data: Bytes,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

impl ImageAsset {
    /// Id of the asset.
    pub fn id(&self) -> &str {
        match self {
            ImageAsset::File { id, .. } | ImageAsset::Data { id, .. } => id,
        }
    }

    /// Loads the asset into memory.
    pub fn decode(&self) -> Result<DecodedImage, TilekilnError> {
        match self {
            ImageAsset::File { path, .. } => {
                let bytes = std::fs::read(path)?;
                DecodedImage::new_resized(&bytes, FILE_ICON_SIZE, FILE_ICON_SIZE)
            }
            ImageAsset::Data {
                data,
                width,
                height,
                ..
            } => DecodedImage::from_raw(data.to_vec(), *width, *height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn file_asset_is_resized() {
        let path = std::env::temp_dir().join(format!("tilekiln-icon-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(40, 24)).unwrap();

        let asset = ImageAsset::File {
            id: "marker".into(),
            path: path.clone(),
        };
        let image = asset.decode().unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(asset.id(), "marker");
        assert_eq!(image.dimensions, (FILE_ICON_SIZE, FILE_ICON_SIZE));
        assert_eq!(image.bytes.len(), 16 * 16 * 4);
    }

    #[test]
    fn data_asset_keeps_size() {
        let asset = ImageAsset::Data {
            id: "dot".into(),
            data: Bytes::from(vec![255; 3 * 2 * 4]),
            width: 3,
            height: 2,
        };
        let image = asset.decode().unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
    }

    #[test]
    fn data_asset_with_wrong_length() {
        let asset = ImageAsset::Data {
            id: "dot".into(),
            data: Bytes::from(vec![255; 10]),
            width: 3,
            height: 2,
        };
        assert_matches!(asset.decode(), Err(TilekilnError::Generic(_)));
    }

    #[test]
    fn missing_file() {
        let asset = ImageAsset::File {
            id: "nope".into(),
            path: "/definitely/not/here.png".into(),
        };
        assert_matches!(asset.decode(), Err(TilekilnError::FsIo(_)));
    }
}
