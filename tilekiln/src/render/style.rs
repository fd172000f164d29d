//! See [`StyleDocument`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tilekiln_mvt::MvtFeature;

use crate::color::Color;
use crate::error::TilekilnError;

/// Tile template used when a source does not declare any.
pub const DEFAULT_TILE_TEMPLATE: &str = "{z}-{x}-{y}";

/// Declarative description of how vector data is drawn.
///
/// The document is owned by the caller. A render context keeps its own copy, so changes to the
/// caller's value only take effect after the next style update.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    /// Vector sources by name.
    #[serde(default)]
    pub sources: BTreeMap<String, StyleSource>,
    /// Layers, drawn in order.
    #[serde(default)]
    pub layers: Vec<StyleLayer>,
}

impl StyleDocument {
    /// Parses and validates a JSON style document.
    pub fn from_json(json: &str) -> Result<Self, TilekilnError> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;

        Ok(document)
    }

    /// Checks that every data layer references a declared source.
    pub fn validate(&self) -> Result<(), TilekilnError> {
        for layer in &self.layers {
            if layer.layer_type == LayerType::Background {
                continue;
            }

            let Some(source) = &layer.source else {
                return Err(TilekilnError::Style(format!(
                    "layer {} has no source",
                    layer.id
                )));
            };

            if !self.sources.contains_key(source) {
                return Err(TilekilnError::Style(format!(
                    "layer {} references unknown source {source}",
                    layer.id
                )));
            }
        }

        Ok(())
    }

    /// Returns the layer with the given id.
    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}

/// A source of vector tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSource {
    /// Tile key templates with `{z}`, `{x}` and `{y}` placeholders. Only the first one is used.
    #[serde(default = "default_tiles")]
    pub tiles: Vec<String>,
    /// Lowest zoom level the source has tiles for.
    #[serde(default)]
    pub minzoom: u32,
    /// Highest zoom level the source has tiles for. Deeper zooms overzoom this level.
    #[serde(default = "default_maxzoom")]
    pub maxzoom: u32,
    /// Size of a source tile in pixels.
    #[serde(rename = "tileSize", default = "default_tile_size")]
    pub tile_size: u32,
}

impl StyleSource {
    /// Template used to build tile keys.
    pub fn template(&self) -> &str {
        self.tiles
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TILE_TEMPLATE)
    }
}

impl Default for StyleSource {
    fn default() -> Self {
        Self {
            tiles: default_tiles(),
            minzoom: 0,
            maxzoom: default_maxzoom(),
            tile_size: default_tile_size(),
        }
    }
}

fn default_tiles() -> Vec<String> {
    vec![DEFAULT_TILE_TEMPLATE.to_string()]
}

fn default_maxzoom() -> u32 {
    22
}

fn default_tile_size() -> u32 {
    512
}

/// Kind of a style layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Fills the whole image.
    Background,
    /// Polygon fill.
    Fill,
    /// Stroked lines.
    Line,
    /// Circles at point features.
    Circle,
    /// Icons at point features.
    Symbol,
}

/// One drawing step of the style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    /// Unique layer id.
    pub id: String,
    /// Layer kind.
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    /// Name of the source, required for every type except `background`.
    #[serde(default)]
    pub source: Option<String>,
    /// Name of the layer inside the vector tile.
    #[serde(rename = "source-layer", default)]
    pub source_layer: Option<String>,
    /// The layer is hidden below this zoom.
    #[serde(default)]
    pub minzoom: Option<f64>,
    /// The layer is hidden at and above this zoom.
    #[serde(default)]
    pub maxzoom: Option<f64>,
    /// Properties a feature must have to be drawn by this layer.
    #[serde(default)]
    pub filter: HashMap<String, serde_json::Value>,
    /// Paint properties.
    #[serde(default)]
    pub paint: Paint,
}

impl StyleLayer {
    /// Whether the layer is drawn at the given zoom level.
    pub fn is_visible_at(&self, zoom: f64) -> bool {
        self.minzoom.map_or(true, |min| zoom >= min) && self.maxzoom.map_or(true, |max| zoom < max)
    }

    /// Whether the feature passes the layer filter.
    pub fn matches(&self, feature: &MvtFeature) -> bool {
        self.filter.iter().all(|(key, expected)| {
            let Some(value) = feature.properties.get(key) else {
                return false;
            };

            match expected {
                serde_json::Value::String(s) => value.eq_str(s),
                other => value.eq_str(&other.to_string()),
            }
        })
    }
}

/// Paint properties of a layer. Properties that do not apply to the layer type are ignored.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Paint {
    /// Color of a background layer.
    pub background_color: Option<Color>,
    /// Polygon fill color.
    pub fill_color: Option<Color>,
    /// Polygon outline color. Outlines are not drawn if not set.
    pub fill_outline_color: Option<Color>,
    /// Line color.
    pub line_color: Option<Color>,
    /// Line width in pixels.
    pub line_width: Option<f32>,
    /// Circle color.
    pub circle_color: Option<Color>,
    /// Circle radius in pixels.
    pub circle_radius: Option<f32>,
    /// Id of a registered image drawn at point features.
    pub icon_image: Option<String>,
}

impl Paint {
    /// Background color, black if not set.
    pub fn background_color(&self) -> Color {
        self.background_color.unwrap_or(Color::BLACK)
    }

    /// Fill color, black if not set.
    pub fn fill_color(&self) -> Color {
        self.fill_color.unwrap_or(Color::BLACK)
    }

    /// Line color, black if not set.
    pub fn line_color(&self) -> Color {
        self.line_color.unwrap_or(Color::BLACK)
    }

    /// Line width, 1 px if not set.
    pub fn line_width(&self) -> f32 {
        self.line_width.unwrap_or(1.0)
    }

    /// Circle color, black if not set.
    pub fn circle_color(&self) -> Color {
        self.circle_color.unwrap_or(Color::BLACK)
    }

    /// Circle radius, 5 px if not set.
    pub fn circle_radius(&self) -> f32 {
        self.circle_radius.unwrap_or(5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tilekiln_mvt::{MvtGeometry, MvtValue};

    const STYLE: &str = r##"{
        "sources": {
            "base": { "tiles": ["{z}/{x}/{y}"], "maxzoom": 14, "tileSize": 256 }
        },
        "layers": [
            { "id": "bg", "type": "background", "paint": { "background-color": "#102030" } },
            {
                "id": "water",
                "type": "fill",
                "source": "base",
                "source-layer": "water",
                "minzoom": 2,
                "filter": { "class": "lake", "rank": 3 },
                "paint": { "fill-color": "#0000FF80", "fill-outline-color": "#000000" }
            },
            { "id": "roads", "type": "line", "source": "base", "source-layer": "roads" }
        ]
    }"##;

    fn feature(properties: &[(&str, MvtValue)]) -> MvtFeature {
        MvtFeature {
            id: None,
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            geometry: MvtGeometry::Point(vec![]),
        }
    }

    #[test]
    fn parse_document() {
        let style = StyleDocument::from_json(STYLE).unwrap();
        assert_eq!(style.layers.len(), 3);

        let source = &style.sources["base"];
        assert_eq!(source.template(), "{z}/{x}/{y}");
        assert_eq!(source.minzoom, 0);
        assert_eq!(source.maxzoom, 14);
        assert_eq!(source.tile_size, 256);

        let bg = style.layer("bg").unwrap();
        assert_eq!(bg.layer_type, LayerType::Background);
        assert_eq!(bg.paint.background_color(), Color::rgba(16, 32, 48, 255));

        let water = style.layer("water").unwrap();
        assert_eq!(water.source_layer.as_deref(), Some("water"));
        assert_eq!(water.paint.fill_color(), Color::rgba(0, 0, 255, 128));
        assert_eq!(water.paint.fill_outline_color, Some(Color::BLACK));

        let roads = style.layer("roads").unwrap();
        assert_eq!(roads.paint.line_width(), 1.0);
    }

    #[test]
    fn default_source() {
        let style = StyleDocument::from_json(r#"{ "sources": { "s": {} } }"#).unwrap();
        assert_eq!(style.sources["s"], StyleSource::default());
        assert_eq!(style.sources["s"].tile_size, 512);
        assert_eq!(style.sources["s"].template(), DEFAULT_TILE_TEMPLATE);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let json = r#"{ "layers": [ { "id": "a", "type": "fill", "source": "nope" } ] }"#;
        assert_matches!(StyleDocument::from_json(json), Err(TilekilnError::Style(_)));

        let json = r#"{ "layers": [ { "id": "a", "type": "line" } ] }"#;
        assert_matches!(StyleDocument::from_json(json), Err(TilekilnError::Style(_)));
    }

    #[test]
    fn invalid_json_is_style_error() {
        assert_matches!(
            StyleDocument::from_json(r#"{ "layers": [ { "id": "a", "type": "hillshade" } ] }"#),
            Err(TilekilnError::Style(_))
        );
        assert_matches!(
            StyleDocument::from_json("not json"),
            Err(TilekilnError::Style(_))
        );
    }

    #[test]
    fn zoom_visibility() {
        let style = StyleDocument::from_json(STYLE).unwrap();
        let water = style.layer("water").unwrap();
        assert!(!water.is_visible_at(1.0));
        assert!(water.is_visible_at(2.0));
        assert!(water.is_visible_at(20.0));

        let mut bounded = water.clone();
        bounded.maxzoom = Some(5.0);
        assert!(bounded.is_visible_at(4.0));
        assert!(!bounded.is_visible_at(5.0));
    }

    #[test]
    fn filter() {
        let style = StyleDocument::from_json(STYLE).unwrap();
        let water = style.layer("water").unwrap();

        assert!(water.matches(&feature(&[
            ("class", MvtValue::String("lake".into())),
            ("rank", MvtValue::Int64(3)),
        ])));
        assert!(!water.matches(&feature(&[
            ("class", MvtValue::String("lake".into())),
            ("rank", MvtValue::Int64(4)),
        ])));
        assert!(!water.matches(&feature(&[("class", MvtValue::String("lake".into()))])));

        let roads = style.layer("roads").unwrap();
        assert!(roads.matches(&feature(&[])));
    }
}
