//! This example shows how to render a vector tile into a PNG file.
//!
//! The vector data is generated in place: a single tile at zoom 0 with a "water" polygon and a
//! few "poi" points. Running it creates `tile.png` (tile `1/0/0`) and `overview.png` (an overview
//! of Western Europe) in the current directory.
//!
//! ```shell
//! cargo run --example render_tile
//! ```

use anyhow::Result;
use bytes::Bytes;
use geozero::mvt::tile::{Feature, GeomType, Layer};
use geozero::mvt::{Message, Tile};
use tilekiln::render::StyleDocument;
use tilekiln::renderer::{PixelCanvas, VectorTileRendererBuilder};
use tilekiln::source::{FnSource, TileLoadError};
use tilekiln::tilekiln_types::{Extent, GeoPoint2d};
use tilekiln::TileIndex;

const STYLE: &str = r##"{
    "sources": { "demo": { "tiles": ["{z}-{x}-{y}"], "maxzoom": 0 } },
    "layers": [
        { "id": "land", "type": "background", "paint": { "background-color": "#F2EFE9" } },
        {
            "id": "water",
            "type": "fill",
            "source": "demo",
            "source-layer": "water",
            "paint": { "fill-color": "#A0C8F0", "fill-outline-color": "#6090C0" }
        },
        {
            "id": "poi",
            "type": "circle",
            "source": "demo",
            "source-layer": "poi",
            "paint": { "circle-color": "#D04030", "circle-radius": 6 }
        }
    ]
}"##;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let payload = demo_tile();
    let source = FnSource::new(move |x: u32, y: u32, z: u32| {
        let payload = payload.clone();
        async move {
            match (x, y, z) {
                (0, 0, 0) => Ok(payload),
                _ => Err(TileLoadError::DoesNotExist),
            }
        }
    });

    let renderer = VectorTileRendererBuilder::new(source)
        .with_style(StyleDocument::from_json(STYLE)?)
        .build()?;
    renderer.initialize().await?;

    let tile = renderer
        .render_tile::<PixelCanvas>(TileIndex::new(1, 0, 1), None)
        .await?;
    if let Some(png) = tile.into_encoded() {
        std::fs::write("tile.png", &png)?;
        log::info!("Tile written to tile.png");
    }

    let europe = Extent::new(
        GeoPoint2d::lonlat(-10.0, 35.0),
        GeoPoint2d::lonlat(20.0, 60.0),
    );
    let overview = renderer.render_overview(&europe).await?;
    std::fs::write("overview.png", &overview)?;
    log::info!("Overview written to overview.png");

    Ok(())
}

fn zigzag(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn demo_tile() -> Bytes {
    // MoveTo(512, 512) LineTo(+2048, 0) (0, +1536) (-2048, 0) ClosePath
    let lake = vec![
        9,
        zigzag(512),
        zigzag(512),
        26,
        zigzag(2048),
        0,
        0,
        zigzag(1536),
        zigzag(-2048),
        0,
        15,
    ];
    // MoveTo(3) (3000, 1000) (+200, +1500) (-1600, +800)
    let pois = vec![
        25,
        zigzag(3000),
        zigzag(1000),
        zigzag(200),
        zigzag(1500),
        zigzag(-1600),
        zigzag(800),
    ];

    let tile = Tile {
        layers: vec![
            layer("water", GeomType::Polygon, lake),
            layer("poi", GeomType::Point, pois),
        ],
    };

    Bytes::from(tile.encode_to_vec())
}

fn layer(name: &str, geom_type: GeomType, geometry: Vec<u32>) -> Layer {
    Layer {
        version: 2,
        name: name.into(),
        features: vec![Feature {
            id: None,
            tags: vec![],
            r#type: Some(geom_type as i32),
            geometry,
        }],
        keys: vec![],
        values: vec![],
        extent: Some(4096),
    }
}
