//! Renders tiles of the slippy-map pyramid from a style and a vector data source.
//!
//! [`VectorTileRenderer`] owns one native rendering context per style and source pairing.
//! The context is not reentrant, so every call into it goes through a [`RenderGate`]: concurrent
//! tile requests are rendered one after another in the order they arrived. Independent renderers
//! do not share anything and can render at the same time.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tilekiln_types::{pixel_to_geo, Extent};

use crate::async_runtime;
use crate::decoded_image::ImageAsset;
use crate::error::TilekilnError;
use crate::render::{
    ImageOptions, NativeRenderer, RawImage, RenderOptions, SkiaRenderer, StyleDocument,
};
use crate::source::{SourceRequester, VectorTileSource};
use crate::tile_scheme::{image_dimensions_for_extent, smallest_tile_containing_extent, TileIndex};

mod builder;
mod canvas;
mod gate;
pub mod postprocess;

pub use builder::VectorTileRendererBuilder;
pub use canvas::{PixelCanvas, TileCanvas};
pub use gate::{RenderGate, RenderPermit};

/// Size of a pyramid tile in pixels used to locate tile centers.
pub const REFERENCE_TILE_SIZE: u32 = 256;

/// Lifecycle of the native rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Style and images are not loaded yet.
    Uninitialized,
    /// [`VectorTileRenderer::initialize`] is running.
    Initializing,
    /// Tiles can be rendered.
    Ready,
}

/// Result of a tile render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedTile<C> {
    /// The canvas given with the request, with the tile drawn into it.
    Canvas(C),
    /// PNG image.
    Encoded(Bytes),
}

impl<C> RenderedTile<C> {
    /// Returns the encoded image, if the tile was not drawn into a canvas.
    pub fn into_encoded(self) -> Option<Bytes> {
        match self {
            RenderedTile::Encoded(bytes) => Some(bytes),
            RenderedTile::Canvas(_) => None,
        }
    }

    /// Returns the canvas, if one was given with the request.
    pub fn into_canvas(self) -> Option<C> {
        match self {
            RenderedTile::Canvas(canvas) => Some(canvas),
            RenderedTile::Encoded(_) => None,
        }
    }
}

/// Renders styled vector tiles. Use [`VectorTileRendererBuilder`] to create one.
pub struct VectorTileRenderer<S, N = SkiaRenderer> {
    source: S,
    gate: RenderGate<N>,
    style: Mutex<StyleDocument>,
    images: Vec<ImageAsset>,
    tile_size: u32,
    state: Mutex<ContextState>,
}

impl<S, N> VectorTileRenderer<S, N>
where
    S: VectorTileSource,
    N: NativeRenderer,
{
    /// Loads the style and the images into the native context.
    ///
    /// Calling it on an initialized renderer does nothing. If loading fails the renderer stays
    /// uninitialized and the call can be repeated.
    pub async fn initialize(&self) -> Result<(), TilekilnError> {
        let mut native = self.gate.acquire().await;
        if self.state() == ContextState::Ready {
            log::debug!("Render context is already initialized");
            return Ok(());
        }

        self.set_state(ContextState::Initializing);
        let result = self.load_context(&mut *native);
        self.set_state(match result {
            Ok(()) => ContextState::Ready,
            Err(_) => ContextState::Uninitialized,
        });

        result
    }

    fn load_context(&self, native: &mut N) -> Result<(), TilekilnError> {
        let style = self.style.lock().clone();
        native.load_style(&style)?;

        for asset in &self.images {
            let image = asset.decode()?;
            native.add_image(
                asset.id(),
                image,
                ImageOptions {
                    pixel_ratio: 1.0,
                    sdf: false,
                },
            )?;
            log::trace!("Registered image {}", asset.id());
        }

        log::debug!(
            "Render context initialized with {} images",
            self.images.len()
        );

        Ok(())
    }

    /// Replaces the style.
    ///
    /// An initialized context reloads the style right away, images stay registered. Otherwise
    /// only the stored document is replaced and it is loaded by [`Self::initialize`].
    pub async fn update_style(&self, style: StyleDocument) -> Result<(), TilekilnError> {
        style.validate()?;

        let mut native = self.gate.acquire().await;
        if self.state() == ContextState::Ready {
            native.load_style(&style)?;
            log::debug!("Render context style updated");
        }

        *self.style.lock() = style;
        Ok(())
    }

    /// Renders a tile.
    ///
    /// With a canvas the tile is drawn at the canvas size into it and the canvas is returned,
    /// otherwise a PNG of [`Self::tile_size`] pixels is produced. Missing vector data renders as
    /// an empty tile. Errors of the native renderer are returned as is and are not retried.
    pub async fn render_tile<C: TileCanvas>(
        &self,
        index: TileIndex,
        canvas: Option<C>,
    ) -> Result<RenderedTile<C>, TilekilnError> {
        if !index.is_valid() {
            return Err(TilekilnError::Generic(format!(
                "tile index {index:?} is outside of the pyramid"
            )));
        }

        let (width, height) = match &canvas {
            Some(canvas) => (canvas.width(), canvas.height()),
            None => (self.tile_size, self.tile_size),
        };

        let image = self.render_image(index, width, height).await?;

        match canvas {
            Some(mut canvas) => {
                canvas.put_image_data(&image.data)?;
                Ok(RenderedTile::Canvas(canvas))
            }
            None => Ok(RenderedTile::Encoded(postprocess::encode_png(image)?)),
        }
    }

    /// Renders a tile in the background and calls `done` with the result.
    pub fn render_tile_with<C, F>(self: &Arc<Self>, index: TileIndex, canvas: Option<C>, done: F)
    where
        S: 'static,
        N: 'static,
        C: TileCanvas + 'static,
        F: FnOnce(Result<RenderedTile<C>, TilekilnError>) + Send + 'static,
    {
        let renderer = self.clone();
        async_runtime::spawn(async move {
            let result = renderer.render_tile(index, canvas).await;
            done(result);
        });
    }

    /// Renders a PNG overview of the extent.
    ///
    /// The image shows the tile returned by [`smallest_tile_containing_extent`] with the size
    /// from [`image_dimensions_for_extent`]. If the tile cannot be determined, the whole world is
    /// rendered.
    pub async fn render_overview(&self, extent: &Extent) -> Result<Bytes, TilekilnError> {
        let index = smallest_tile_containing_extent(extent.lower_left, extent.upper_right);
        if index == TileIndex::UNKNOWN {
            log::debug!("No covering tile found for extent {extent:?}, rendering the world tile");
        }

        let size = image_dimensions_for_extent(extent.lower_left, extent.upper_right);
        let image = self.render_image(index, size.width, size.height).await?;

        postprocess::encode_png(image)
    }

    async fn render_image(
        &self,
        index: TileIndex,
        width: u32,
        height: u32,
    ) -> Result<RawImage, TilekilnError> {
        let center = pixel_to_geo(
            (index.x as f64 + 0.5) * REFERENCE_TILE_SIZE as f64,
            (index.y as f64 + 0.5) * REFERENCE_TILE_SIZE as f64,
            index.z,
            REFERENCE_TILE_SIZE,
        );
        let scale = if index.z == 0 { 2 } else { 1 };
        let (Some(render_width), Some(render_height)) =
            (width.checked_mul(scale), height.checked_mul(scale))
        else {
            return Err(TilekilnError::Render(format!(
                "render size {width}x{height} is too large for tile {index:?}"
            )));
        };
        let options = RenderOptions {
            center,
            zoom: index.z.saturating_sub(1),
            width: render_width,
            height: render_height,
        };

        let raw = {
            let mut native = self.gate.acquire().await;
            if self.state() != ContextState::Ready {
                return Err(TilekilnError::NotInitialized);
            }

            log::debug!(
                "Rendering tile {index:?} at {}x{}",
                options.width,
                options.height
            );
            let requester = SourceRequester::new(&self.source);
            native.render(&options, &requester).await.map_err(|err| {
                log::warn!("Failed to render tile {index:?}: {err}");
                err
            })?
        };

        postprocess::fit(raw, width, height)
    }

    /// Current state of the native context.
    pub fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn set_state(&self, state: ContextState) {
        *self.state.lock() = state;
    }

    /// Copy of the current style.
    pub fn style(&self) -> StyleDocument {
        self.style.lock().clone()
    }

    /// Size of tiles rendered without a canvas.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Data source of the renderer.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns true while a render or a style load is in progress.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }
}
