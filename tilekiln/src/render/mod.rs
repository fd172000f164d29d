//! Native rasterization of styled vector data.
//!
//! A [`NativeRenderer`] is a long-lived, stateful and non-reentrant rendering context. It holds
//! the loaded style and the registered images, and pulls vector payloads through a
//! [`ResourceRequester`] while rendering. [`SkiaRenderer`] is the default CPU implementation.

use async_trait::async_trait;
use bytes::Bytes;
use tilekiln_types::GeoPoint2d;

use crate::decoded_image::DecodedImage;
use crate::error::TilekilnError;
use crate::source::TileLoadError;

mod skia;
pub mod style;

pub use skia::SkiaRenderer;
pub use style::StyleDocument;

/// Parameters of a single native render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Geographic center of the rendered image.
    pub center: GeoPoint2d,
    /// Zoom level in the renderer convention: the world is `512 * 2^zoom` pixels wide.
    pub zoom: u32,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Options of a registered image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    /// Number of image pixels per rendered pixel.
    pub pixel_ratio: f32,
    /// Whether the alpha channel is a signed distance field.
    pub sdf: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            sdf: false,
        }
    }
}

/// Rendered pixels, straight (not premultiplied) RGBA8, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl RawImage {
    /// RGBA value of the pixel at the given position.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Callback used by a renderer to load vector payloads by their key.
#[async_trait]
pub trait ResourceRequester: Send + Sync {
    /// Resolves the payload for the key. Errors mean "no data" for the renderer.
    async fn request(&self, key: &str) -> Result<Bytes, TileLoadError>;
}

/// Rendering context bound to one style.
#[async_trait]
pub trait NativeRenderer: Send {
    /// Replaces the active style.
    fn load_style(&mut self, style: &StyleDocument) -> Result<(), TilekilnError>;

    /// Registers an image referenced by `icon-image` paint properties.
    fn add_image(
        &mut self,
        id: &str,
        image: DecodedImage,
        options: ImageOptions,
    ) -> Result<(), TilekilnError>;

    /// Renders one image. Vector data is requested through `requester`; the call does not
    /// return before all requests it issued have resolved.
    async fn render(
        &mut self,
        options: &RenderOptions,
        requester: &dyn ResourceRequester,
    ) -> Result<RawImage, TilekilnError>;
}
