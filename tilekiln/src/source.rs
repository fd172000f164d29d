//! Vector data supplied by the application.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::render::ResourceRequester;
use crate::tile_scheme::TileIndex;

/// Error that can occur when trying to load a vector tile payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileLoadError {
    /// Tile with the given index does not exist.
    #[error("tile does not exist")]
    DoesNotExist,
    /// The storage backing the source failed.
    #[error("tile source failed: {0}")]
    Backend(String),
}

/// Provider of encoded vector tile payloads (Mapbox Vector Tile protobuf).
///
/// A failed load is never fatal for a render: the tile is drawn as if it contained no features.
#[async_trait]
pub trait VectorTileSource: Send + Sync {
    /// Load the payload of the tile with the given index.
    async fn fetch(&self, index: TileIndex) -> Result<Bytes, TileLoadError>;
}

#[async_trait]
impl<T: VectorTileSource + ?Sized> VectorTileSource for Arc<T> {
    async fn fetch(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        (**self).fetch(index).await
    }
}

/// Source backed by an async function `(x, y, z) -> payload`.
///
/// ```no_run
/// use bytes::Bytes;
/// use tilekiln::source::{FnSource, TileLoadError};
///
/// let source = FnSource::new(|x: u32, y: u32, z: u32| async move {
///     let path = format!("tiles/{z}/{x}/{y}.pbf");
///     std::fs::read(path)
///         .map(Bytes::from)
///         .map_err(|_| TileLoadError::DoesNotExist)
/// });
/// ```
pub struct FnSource<F> {
    fetch_fn: F,
}

impl<F> FnSource<F> {
    /// Creates a new source.
    pub fn new(fetch_fn: F) -> Self {
        Self { fetch_fn }
    }
}

#[async_trait]
impl<F, Fut> VectorTileSource for FnSource<F>
where
    F: Fn(u32, u32, u32) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, TileLoadError>> + Send,
{
    async fn fetch(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        (self.fetch_fn)(index.x, index.y, index.z).await
    }
}

/// Resolves keys requested by the rasterizer against a [`VectorTileSource`].
pub(crate) struct SourceRequester<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: VectorTileSource + ?Sized> SourceRequester<'a, S> {
    pub(crate) fn new(source: &'a S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: VectorTileSource + ?Sized> ResourceRequester for SourceRequester<'_, S> {
    async fn request(&self, key: &str) -> Result<Bytes, TileLoadError> {
        let Some(index) = TileIndex::from_key(key) else {
            log::warn!("Cannot resolve tile key {key:?}");
            return Err(TileLoadError::DoesNotExist);
        };

        if !index.is_valid() {
            log::debug!("Tile key {key:?} is outside of the tile pyramid");
            return Err(TileLoadError::DoesNotExist);
        }

        log::trace!("Fetching tile {index:?}");
        self.source.fetch(index).await
    }
}
