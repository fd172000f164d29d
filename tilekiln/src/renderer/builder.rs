use parking_lot::Mutex;

use super::gate::RenderGate;
use super::{ContextState, VectorTileRenderer, REFERENCE_TILE_SIZE};
use crate::decoded_image::ImageAsset;
use crate::error::TilekilnError;
use crate::render::{NativeRenderer, SkiaRenderer, StyleDocument};
use crate::source::VectorTileSource;

/// Constructor for a [`VectorTileRenderer`].
///
/// ```
/// use bytes::Bytes;
/// use tilekiln::render::StyleDocument;
/// use tilekiln::renderer::VectorTileRendererBuilder;
/// use tilekiln::source::{FnSource, TileLoadError};
///
/// let style = StyleDocument::from_json(r##"{
///     "layers": [
///         { "id": "bg", "type": "background", "paint": { "background-color": "#EEEEEE" } }
///     ]
/// }"##)?;
///
/// let renderer = VectorTileRendererBuilder::new(FnSource::new(|_x: u32, _y: u32, _z: u32| async {
///     Err::<Bytes, _>(TileLoadError::DoesNotExist)
/// }))
/// .with_style(style)
/// .with_tile_size(512)
/// .build()?;
///
/// assert_eq!(renderer.tile_size(), 512);
/// # Ok::<(), tilekiln::error::TilekilnError>(())
/// ```
pub struct VectorTileRendererBuilder<S, N = SkiaRenderer> {
    source: S,
    native: N,
    style: Option<StyleDocument>,
    images: Vec<ImageAsset>,
    tile_size: u32,
}

impl<S: VectorTileSource> VectorTileRendererBuilder<S> {
    /// Initializes a builder for a renderer that takes its data from the given source and draws
    /// with [`SkiaRenderer`].
    pub fn new(source: S) -> Self {
        Self {
            source,
            native: SkiaRenderer::new(),
            style: None,
            images: vec![],
            tile_size: REFERENCE_TILE_SIZE,
        }
    }
}

impl<S: VectorTileSource, N: NativeRenderer> VectorTileRendererBuilder<S, N> {
    /// Sets the style document. Required.
    pub fn with_style(mut self, style: StyleDocument) -> Self {
        self.style = Some(style);
        self
    }

    /// Adds images registered with the native context on initialization.
    pub fn with_images(mut self, images: impl IntoIterator<Item = ImageAsset>) -> Self {
        self.images.extend(images);
        self
    }

    /// Sets the size of produced tiles when no canvas is given. Defaults to 256 px.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Replaces the native rendering context.
    pub fn with_native<M: NativeRenderer>(self, native: M) -> VectorTileRendererBuilder<S, M> {
        VectorTileRendererBuilder {
            source: self.source,
            native,
            style: self.style,
            images: self.images,
            tile_size: self.tile_size,
        }
    }

    /// Consumes the builder and constructs the renderer. The renderer must still be
    /// [initialized](VectorTileRenderer::initialize) before use.
    ///
    /// Fails if the style is not set or is invalid, or if the tile size is zero.
    pub fn build(self) -> Result<VectorTileRenderer<S, N>, TilekilnError> {
        let Some(style) = self.style else {
            return Err(TilekilnError::Style("style is not set".into()));
        };
        style.validate()?;

        if self.tile_size == 0 {
            return Err(TilekilnError::Generic("tile size must be positive".into()));
        }

        Ok(VectorTileRenderer {
            source: self.source,
            gate: RenderGate::new(self.native),
            style: Mutex::new(style),
            images: self.images,
            tile_size: self.tile_size,
            state: Mutex::new(ContextState::Uninitialized),
        })
    }
}
