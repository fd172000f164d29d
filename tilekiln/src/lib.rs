//! Tilekiln renders slippy-map tiles from vector data and a declarative style.
//!
//! # Quick start
//!
//! ```no_run
//! use bytes::Bytes;
//! use tilekiln::render::StyleDocument;
//! use tilekiln::renderer::VectorTileRendererBuilder;
//! use tilekiln::source::{FnSource, TileLoadError};
//! use tilekiln::tile_scheme::TileIndex;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let style = StyleDocument::from_json(&std::fs::read_to_string("style.json")?)?;
//! let source = FnSource::new(|x: u32, y: u32, z: u32| async move {
//!     std::fs::read(format!("tiles/{z}/{x}/{y}.pbf"))
//!         .map(Bytes::from)
//!         .map_err(|_| TileLoadError::DoesNotExist)
//! });
//!
//! let renderer = VectorTileRendererBuilder::new(source)
//!     .with_style(style)
//!     .build()?;
//! renderer.initialize().await?;
//!
//! let png = renderer
//!     .render_tile::<tilekiln::renderer::PixelCanvas>(TileIndex::new(1, 0, 1), None)
//!     .await?
//!     .into_encoded();
//! # Ok::<(), tilekiln::error::TilekilnError>(())
//! # });
//! ```
//!
//! # Main components
//!
//! * [`tile_scheme`] contains pure functions of the tile pyramid: tile bounding boxes in Web
//!   Mercator, the smallest tile covering an extent, image sizes for extents and box
//!   intersection.
//! * [`source`] defines how encoded vector tiles are provided by the application.
//! * [`render`] has the style document and the native rendering context, which rasterizes
//!   vector tiles.
//! * [`renderer`] turns tile requests into native render calls. Calls into one context are
//!   serialized, and the raw pixels are resized and encoded or written into a canvas.

pub(crate) mod async_runtime;
mod color;
pub mod decoded_image;
pub mod error;
pub mod render;
pub mod renderer;
pub mod source;
pub mod tile_scheme;

#[cfg(test)]
pub(crate) mod tests;

pub use color::Color;
pub use decoded_image::{DecodedImage, ImageAsset};
pub use renderer::{RenderedTile, VectorTileRenderer, VectorTileRendererBuilder};
pub use tile_scheme::TileIndex;
pub use tilekiln_mvt;
pub use tilekiln_types;
