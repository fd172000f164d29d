//! Fixtures shared by the unit tests of the crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use geozero::mvt::tile::{Feature, GeomType, Layer, Value};
use geozero::mvt::{Message, Tile};
use parking_lot::Mutex;

use crate::decoded_image::DecodedImage;
use crate::error::TilekilnError;
use crate::render::{
    ImageOptions, NativeRenderer, RawImage, RenderOptions, ResourceRequester, StyleDocument,
};
use crate::source::{TileLoadError, VectorTileSource};
use crate::tile_scheme::TileIndex;

pub(crate) const EXTENT: i32 = 4096;

pub(crate) fn zigzag(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

pub(crate) fn command(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

/// Closed rings through the given points, in tile coordinates. The command cursor carries over
/// from one ring to the next.
pub(crate) fn rings(rings: &[&[(i32, i32)]]) -> Vec<u32> {
    let mut geometry = vec![];
    let mut cursor = (0, 0);
    for points in rings {
        for (i, &(x, y)) in points.iter().enumerate() {
            if i == 0 {
                geometry.push(command(1, 1));
            } else if i == 1 {
                geometry.push(command(2, points.len() as u32 - 1));
            }
            geometry.push(zigzag(x - cursor.0));
            geometry.push(zigzag(y - cursor.1));
            cursor = (x, y);
        }
        geometry.push(command(7, 1));
    }

    geometry
}

pub(crate) fn ring(points: &[(i32, i32)]) -> Vec<u32> {
    rings(&[points])
}

/// Square covering the whole tile, clockwise on screen.
pub(crate) fn full_square() -> Vec<u32> {
    ring(&[(0, 0), (EXTENT, 0), (EXTENT, EXTENT), (0, EXTENT)])
}

pub(crate) fn point(x: i32, y: i32) -> Vec<u32> {
    vec![command(1, 1), zigzag(x), zigzag(y)]
}

pub(crate) fn feature(geom_type: GeomType, geometry: Vec<u32>, tags: Vec<u32>) -> Feature {
    Feature {
        id: None,
        tags,
        r#type: Some(geom_type as i32),
        geometry,
    }
}

/// Layer with a single `class` key. Feature tag `[0, i]` selects `classes[i]`.
pub(crate) fn layer(name: &str, features: Vec<Feature>, classes: &[&str]) -> Layer {
    Layer {
        version: 2,
        name: name.into(),
        features,
        keys: vec!["class".into()],
        values: classes
            .iter()
            .map(|class| Value {
                string_value: Some(class.to_string()),
                ..Default::default()
            })
            .collect(),
        extent: Some(EXTENT as u32),
    }
}

pub(crate) fn encode(layers: Vec<Layer>) -> Bytes {
    Bytes::from(Tile { layers }.encode_to_vec())
}

/// Tile whose `water` layer is one polygon covering the whole tile.
pub(crate) fn water_tile() -> Bytes {
    encode(vec![layer(
        "water",
        vec![feature(GeomType::Polygon, full_square(), vec![])],
        &[],
    )])
}

pub(crate) const BACKGROUND: [u8; 4] = [255, 0, 0, 255];
pub(crate) const WATER: [u8; 4] = [0, 0, 255, 255];

/// Red background with a blue `water` fill from the `base` source.
pub(crate) fn water_style() -> StyleDocument {
    StyleDocument::from_json(
        r##"{
            "sources": { "base": { "tiles": ["{z}-{x}-{y}"], "tileSize": 512 } },
            "layers": [
                { "id": "bg", "type": "background", "paint": { "background-color": "#FF0000" } },
                {
                    "id": "water",
                    "type": "fill",
                    "source": "base",
                    "source-layer": "water",
                    "paint": { "fill-color": "#0000FF" }
                }
            ]
        }"##,
    )
    .unwrap()
}

/// Serves fixed payloads and records every request.
#[derive(Default)]
pub(crate) struct MapSource {
    pub(crate) tiles: HashMap<TileIndex, Bytes>,
    pub(crate) requests: Mutex<Vec<TileIndex>>,
    pub(crate) delay: Option<Duration>,
}

impl MapSource {
    pub(crate) fn with_tile(index: TileIndex, bytes: Bytes) -> Self {
        Self {
            tiles: HashMap::from([(index, bytes)]),
            ..Default::default()
        }
    }
}

#[async_trait]
impl VectorTileSource for MapSource {
    async fn fetch(&self, index: TileIndex) -> Result<Bytes, TileLoadError> {
        self.requests.lock().push(index);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.tiles
            .get(&index)
            .cloned()
            .ok_or(TileLoadError::DoesNotExist)
    }
}

/// Same as [`MapSource`], but keyed by raw request keys.
#[derive(Default)]
pub(crate) struct KeyRequester {
    pub(crate) payloads: HashMap<String, Bytes>,
    pub(crate) requests: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceRequester for KeyRequester {
    async fn request(&self, key: &str) -> Result<Bytes, TileLoadError> {
        self.requests.lock().push(key.to_string());
        self.payloads
            .get(key)
            .cloned()
            .ok_or(TileLoadError::DoesNotExist)
    }
}

/// One native render call as seen by [`MockNative`].
#[derive(Debug, Clone)]
pub(crate) struct RenderCall {
    pub(crate) options: RenderOptions,
    pub(crate) started: Instant,
    pub(crate) finished: Instant,
}

#[derive(Default)]
pub(crate) struct MockLog {
    pub(crate) styles: Vec<StyleDocument>,
    pub(crate) images: Vec<(String, (u32, u32), ImageOptions)>,
    pub(crate) calls: Vec<RenderCall>,
    pub(crate) fetched: Vec<Result<Bytes, TileLoadError>>,
}

/// Instrumented renderer: fills the image with one color after requesting the payload of the
/// tile under the center.
pub(crate) struct MockNative {
    pub(crate) log: Arc<Mutex<MockLog>>,
    pub(crate) duration: Duration,
    pub(crate) fail: bool,
    pub(crate) color: [u8; 4],
}

impl MockNative {
    pub(crate) fn new() -> (Self, Arc<Mutex<MockLog>>) {
        let log = Arc::new(Mutex::new(MockLog::default()));
        (
            Self {
                log: log.clone(),
                duration: Duration::from_millis(0),
                fail: false,
                color: [10, 20, 30, 255],
            },
            log,
        )
    }
}

#[async_trait]
impl NativeRenderer for MockNative {
    fn load_style(&mut self, style: &StyleDocument) -> Result<(), TilekilnError> {
        self.log.lock().styles.push(style.clone());
        Ok(())
    }

    fn add_image(
        &mut self,
        id: &str,
        image: DecodedImage,
        options: ImageOptions,
    ) -> Result<(), TilekilnError> {
        self.log
            .lock()
            .images
            .push((id.to_string(), image.dimensions, options));
        Ok(())
    }

    async fn render(
        &mut self,
        options: &RenderOptions,
        requester: &dyn ResourceRequester,
    ) -> Result<RawImage, TilekilnError> {
        let started = Instant::now();

        let (px, py) = tilekiln_types::geo_to_pixel(&options.center, options.zoom, 512);
        let tile = TileIndex::new((px / 512.0) as u32, (py / 512.0) as u32, options.zoom);
        let fetched = requester.request(&tile.key()).await;

        tokio::time::sleep(self.duration).await;

        let finished = Instant::now();
        let mut log = self.log.lock();
        log.fetched.push(fetched);
        log.calls.push(RenderCall {
            options: *options,
            started,
            finished,
        });

        if self.fail {
            return Err(TilekilnError::Render("mock failure".into()));
        }

        Ok(RawImage {
            width: options.width,
            height: options.height,
            data: self
                .color
                .repeat(options.width as usize * options.height as usize),
        })
    }
}
