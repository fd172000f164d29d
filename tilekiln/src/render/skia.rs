use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use futures::future::join_all;
use tiny_skia::{
    ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};
use tilekiln_mvt::{MvtContour, MvtGeometry, MvtTile, Point};
use tilekiln_types::geo_to_pixel;

use crate::color::Color;
use crate::decoded_image::DecodedImage;
use crate::error::TilekilnError;
use crate::render::style::{LayerType, StyleLayer, StyleSource};
use crate::render::{
    ImageOptions, NativeRenderer, RawImage, RenderOptions, ResourceRequester, StyleDocument,
};

/// Size of a world tile in the zoom convention of the renderer.
const WORLD_TILE_SIZE: u32 = 512;

/// CPU rasterizer built on `tiny-skia`.
///
/// The world at zoom `z` is `512 * 2^z` pixels wide. For every style source the renderer
/// requests the source tiles covering the image, decodes them as Mapbox Vector Tiles and paints
/// the style layers in order.
#[derive(Default)]
pub struct SkiaRenderer {
    style: Option<StyleDocument>,
    images: HashMap<String, Icon>,
}

struct Icon {
    pixmap: Pixmap,
    pixel_ratio: f32,
}

/// Source tile placed on the output image.
#[derive(Debug, Clone, PartialEq)]
struct PlacedTile {
    key: String,
    offset_x: f64,
    offset_y: f64,
    size: f64,
}

impl PlacedTile {
    fn project(&self, point: &Point) -> (f32, f32) {
        (
            (self.offset_x + point.x as f64 * self.size) as f32,
            (self.offset_y + point.y as f64 * self.size) as f32,
        )
    }
}

impl SkiaRenderer {
    /// Creates a renderer without a style.
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_layer(
        &self,
        pixmap: &mut Pixmap,
        layer: &StyleLayer,
        tiles: &[PlacedTile],
        decoded: &HashMap<String, MvtTile>,
    ) {
        if layer.layer_type == LayerType::Background {
            let width = pixmap.width() as f32;
            let height = pixmap.height() as f32;
            if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height) {
                let paint = paint(layer.paint.background_color());
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            return;
        }

        let Some(source_layer) = &layer.source_layer else {
            log::trace!("Layer {} has no source layer", layer.id);
            return;
        };

        for tile in tiles {
            let Some(mvt_layer) = decoded.get(&tile.key).and_then(|t| t.layer(source_layer))
            else {
                continue;
            };

            for feature in mvt_layer.features.iter().filter(|f| layer.matches(f)) {
                match layer.layer_type {
                    LayerType::Fill => draw_fill(pixmap, layer, &feature.geometry, tile),
                    LayerType::Line => draw_line(pixmap, layer, &feature.geometry, tile),
                    LayerType::Circle => draw_circle(pixmap, layer, &feature.geometry, tile),
                    LayerType::Symbol => self.draw_icon(pixmap, layer, &feature.geometry, tile),
                    LayerType::Background => {}
                }
            }
        }
    }

    fn draw_icon(
        &self,
        pixmap: &mut Pixmap,
        layer: &StyleLayer,
        geometry: &MvtGeometry,
        tile: &PlacedTile,
    ) {
        let MvtGeometry::Point(points) = geometry else {
            return;
        };
        let Some(id) = &layer.paint.icon_image else {
            return;
        };
        let Some(icon) = self.images.get(id) else {
            log::debug!("Image {id} used by layer {} is not registered", layer.id);
            return;
        };

        let scale = 1.0 / icon.pixel_ratio;
        let half_width = icon.pixmap.width() as f32 * scale / 2.0;
        let half_height = icon.pixmap.height() as f32 * scale / 2.0;
        for point in points {
            let (x, y) = tile.project(point);
            let transform = Transform::from_row(
                scale,
                0.0,
                0.0,
                scale,
                x - half_width,
                y - half_height,
            );
            pixmap.draw_pixmap(
                0,
                0,
                icon.pixmap.as_ref(),
                &PixmapPaint::default(),
                transform,
                None,
            );
        }
    }
}

#[async_trait]
impl NativeRenderer for SkiaRenderer {
    fn load_style(&mut self, style: &StyleDocument) -> Result<(), TilekilnError> {
        style.validate()?;
        self.style = Some(style.clone());
        log::debug!(
            "Loaded style with {} sources and {} layers",
            style.sources.len(),
            style.layers.len()
        );

        Ok(())
    }

    fn add_image(
        &mut self,
        id: &str,
        image: DecodedImage,
        options: ImageOptions,
    ) -> Result<(), TilekilnError> {
        if options.pixel_ratio.is_nan() || options.pixel_ratio <= 0.0 {
            return Err(TilekilnError::Generic(format!(
                "invalid pixel ratio {} of image {id}",
                options.pixel_ratio
            )));
        }
        if options.sdf {
            log::warn!("Image {id} is a distance field, alpha is drawn as coverage");
        }

        let mut pixmap = Pixmap::new(image.width(), image.height())
            .ok_or_else(|| TilekilnError::Generic(format!("image {id} has zero size")))?;
        for (pixel, rgba) in pixmap
            .pixels_mut()
            .iter_mut()
            .zip(image.bytes().chunks_exact(4))
        {
            *pixel = ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
        }

        self.images.insert(
            id.to_string(),
            Icon {
                pixmap,
                pixel_ratio: options.pixel_ratio,
            },
        );

        Ok(())
    }

    async fn render(
        &mut self,
        options: &RenderOptions,
        requester: &dyn ResourceRequester,
    ) -> Result<RawImage, TilekilnError> {
        let style = self
            .style
            .as_ref()
            .ok_or_else(|| TilekilnError::Render("no style loaded".into()))?;
        let mut pixmap = Pixmap::new(options.width, options.height).ok_or_else(|| {
            TilekilnError::Render(format!(
                "invalid image size {}x{}",
                options.width, options.height
            ))
        })?;

        let (center_x, center_y) = geo_to_pixel(&options.center, options.zoom, WORLD_TILE_SIZE);
        let viewport = Viewport {
            origin_x: center_x - options.width as f64 / 2.0,
            origin_y: center_y - options.height as f64 / 2.0,
            width: options.width as f64,
            height: options.height as f64,
            world_size: WORLD_TILE_SIZE as f64 * 2f64.powi(options.zoom as i32),
        };

        let mut placed = HashMap::new();
        for (name, source) in &style.sources {
            placed.insert(
                name.as_str(),
                visible_tiles(source, options.zoom, &viewport)?,
            );
        }

        let keys: BTreeSet<&str> = placed
            .values()
            .flatten()
            .map(|tile| tile.key.as_str())
            .collect();
        let responses = join_all(
            keys.into_iter()
                .map(|key| async move { (key, requester.request(key).await) }),
        )
        .await;

        let mut decoded = HashMap::new();
        for (key, response) in responses {
            match response {
                Ok(bytes) => match MvtTile::decode(bytes, true) {
                    Ok(tile) => {
                        decoded.insert(key.to_string(), tile);
                    }
                    Err(err) => log::warn!("Failed to decode tile {key}: {err:?}"),
                },
                Err(err) => log::debug!("No data for tile {key}: {err}"),
            }
        }

        let zoom = options.zoom as f64;
        for layer in &style.layers {
            if !layer.is_visible_at(zoom) {
                continue;
            }

            let tiles = layer
                .source
                .as_deref()
                .and_then(|name| placed.get(name))
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.draw_layer(&mut pixmap, layer, tiles, &decoded);
        }

        let mut data = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        Ok(RawImage {
            width: options.width,
            height: options.height,
            data,
        })
    }
}

/// Output image in world pixels of the render zoom.
struct Viewport {
    origin_x: f64,
    origin_y: f64,
    width: f64,
    height: f64,
    world_size: f64,
}

fn source_zoom(source: &StyleSource, zoom: u32) -> u32 {
    let shift = (WORLD_TILE_SIZE as f64 / source.tile_size.max(1) as f64).log2();
    let max_zoom = source.maxzoom.max(source.minzoom);
    let z = (zoom as f64 + shift)
        .round()
        .clamp(source.minzoom as f64, max_zoom as f64);

    z.max(0.0) as u32
}

fn visible_tiles(
    source: &StyleSource,
    zoom: u32,
    viewport: &Viewport,
) -> Result<Vec<PlacedTile>, TilekilnError> {
    let z = source_zoom(source, zoom);
    let tiles_per_side = 1i64 << z.min(30);
    let tile_size = viewport.world_size / tiles_per_side as f64;

    let x_start = (viewport.origin_x / tile_size).floor() as i64;
    let x_end = ((viewport.origin_x + viewport.width) / tile_size).ceil() as i64;
    let y_start = ((viewport.origin_y / tile_size).floor() as i64).max(0);
    let y_end = (((viewport.origin_y + viewport.height) / tile_size).ceil() as i64)
        .min(tiles_per_side);

    let mut tiles = vec![];
    for y in y_start..y_end {
        for x in x_start..x_end {
            let vars = HashMap::from([
                ("z".to_string(), z as i64),
                ("x".to_string(), x.rem_euclid(tiles_per_side)),
                ("y".to_string(), y),
            ]);
            let key = strfmt::strfmt(source.template(), &vars)
                .map_err(|err| TilekilnError::Style(format!("invalid tile template: {err}")))?;

            tiles.push(PlacedTile {
                key,
                offset_x: x as f64 * tile_size - viewport.origin_x,
                offset_y: y as f64 * tile_size - viewport.origin_y,
                size: tile_size,
            });
        }
    }

    Ok(tiles)
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn add_contour(builder: &mut PathBuilder, contour: &MvtContour, tile: &PlacedTile, close: bool) {
    let mut points = contour.points.iter().map(|p| tile.project(p));
    let Some((x, y)) = points.next() else {
        return;
    };

    builder.move_to(x, y);
    for (x, y) in points {
        builder.line_to(x, y);
    }
    if close {
        builder.close();
    }
}

fn draw_fill(pixmap: &mut Pixmap, layer: &StyleLayer, geometry: &MvtGeometry, tile: &PlacedTile) {
    let MvtGeometry::Polygon(polygons) = geometry else {
        return;
    };

    let mut builder = PathBuilder::new();
    for polygon in polygons {
        add_contour(&mut builder, &polygon.exterior, tile, true);
        for hole in &polygon.interiors {
            add_contour(&mut builder, hole, tile, true);
        }
    }
    let Some(path) = builder.finish() else {
        return;
    };

    pixmap.fill_path(
        &path,
        &paint(layer.paint.fill_color()),
        FillRule::EvenOdd,
        Transform::identity(),
        None,
    );

    if let Some(outline) = layer.paint.fill_outline_color {
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &path,
            &paint(outline),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}

fn draw_line(pixmap: &mut Pixmap, layer: &StyleLayer, geometry: &MvtGeometry, tile: &PlacedTile) {
    let mut builder = PathBuilder::new();
    match geometry {
        MvtGeometry::LineString(contours) => {
            for contour in contours {
                add_contour(&mut builder, contour, tile, contour.is_closed);
            }
        }
        MvtGeometry::Polygon(polygons) => {
            for polygon in polygons {
                add_contour(&mut builder, &polygon.exterior, tile, true);
                for hole in &polygon.interiors {
                    add_contour(&mut builder, hole, tile, true);
                }
            }
        }
        MvtGeometry::Point(_) => return,
    }
    let Some(path) = builder.finish() else {
        return;
    };

    let stroke = Stroke {
        width: layer.paint.line_width(),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(
        &path,
        &paint(layer.paint.line_color()),
        &stroke,
        Transform::identity(),
        None,
    );
}

fn draw_circle(pixmap: &mut Pixmap, layer: &StyleLayer, geometry: &MvtGeometry, tile: &PlacedTile) {
    let MvtGeometry::Point(points) = geometry else {
        return;
    };

    let paint = paint(layer.paint.circle_color());
    let radius = layer.paint.circle_radius();
    for point in points {
        let (x, y) = tile.project(point);
        if let Some(path) = PathBuilder::from_circle(x, y, radius) {
            pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}
