//! Decoder for Mapbox Vector Tile (v2) payloads.
//!
//! The renderer receives vector data as opaque protobuf buffers. This crate turns such a buffer
//! into [`MvtTile`]: named layers with features, their properties and geometries. Geometry
//! coordinates are normalized by the layer extent, so `(0, 0)` is the top-left and `(1, 1)` the
//! bottom-right corner of the tile.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bytes::Buf;
use geozero::mvt::tile::{Feature, Layer, Value};
use geozero::mvt::{Message as GeozeroMessage, Tile};
use serde::{Deserialize, Serialize};
use tilekiln_types::Point2;

use crate::error::MvtError;

mod contour;
pub mod error;
mod geometry;

pub use contour::{MvtContour, MvtPolygon};

const DEFAULT_EXTENT: u32 = 4096;

// `GeomType` values of the protobuf schema
const POINT: i32 = 1;
const LINE_STRING: i32 = 2;
const POLYGON: i32 = 3;

/// Decoded vector tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MvtTile {
    /// Layers of the tile in the order they appear in the payload.
    pub layers: Vec<MvtLayer>,
}

/// Named collection of features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvtLayer {
    /// Layer name, referenced by the `source-layer` of a style layer.
    pub name: String,
    /// Features of the layer.
    pub features: Vec<MvtFeature>,
    /// Property keys used by the features.
    pub properties: Vec<String>,
    /// Extent (coordinate resolution) of the layer.
    pub size: u32,
}

/// A single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvtFeature {
    /// Optional feature id.
    pub id: Option<u64>,
    /// Feature attributes.
    pub properties: HashMap<String, MvtValue>,
    /// Feature geometry.
    pub geometry: MvtGeometry,
}

/// Typed feature attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MvtValue {
    /// String value.
    String(String),
    /// Float value.
    Float(f32),
    /// Double value.
    Double(f64),
    // For both Int and Sint variants of protobuf values
    /// Signed integer value.
    Int64(i64),
    /// Unsigned integer value.
    Uint64(u64),
    /// Boolean value.
    Bool(bool),
    /// Value that could not be decoded.
    Unknown,
}

impl Display for MvtValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MvtValue::String(v) => write!(f, "{v}"),
            MvtValue::Float(v) => write!(f, "{v}"),
            MvtValue::Double(v) => write!(f, "{v}"),
            MvtValue::Int64(v) => write!(f, "{v}"),
            MvtValue::Uint64(v) => write!(f, "{v}"),
            MvtValue::Bool(v) => write!(f, "{v}"),
            MvtValue::Unknown => write!(f, "<NONE>"),
        }
    }
}

impl MvtValue {
    /// Compares the value with its string representation, parsing the string into the type of
    /// the value first.
    pub fn eq_str(&self, str_value: &str) -> bool {
        match &self {
            MvtValue::String(s) => s == str_value,
            MvtValue::Float(v) => str_value.parse::<f32>() == Ok(*v),
            MvtValue::Double(v) => str_value.parse::<f64>() == Ok(*v),
            MvtValue::Int64(v) => str_value.parse::<i64>() == Ok(*v),
            MvtValue::Uint64(v) => str_value.parse::<u64>() == Ok(*v),
            MvtValue::Bool(v) => str_value.parse::<bool>() == Ok(*v),
            MvtValue::Unknown => false,
        }
    }
}

/// Point in normalized tile coordinates.
pub type Point = Point2<f32>;

/// Feature geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MvtGeometry {
    /// One or more points.
    Point(Vec<Point>),
    /// One or more line strings.
    LineString(Vec<MvtContour>),
    /// One or more polygons with holes.
    Polygon(Vec<MvtPolygon>),
}

impl MvtTile {
    /// Decodes a protobuf payload.
    ///
    /// With `skip_recoverable_errors` invalid layers, values and features are logged and dropped
    /// instead of failing the whole tile. An empty buffer decodes into a tile without layers.
    pub fn decode<B>(buffer: B, skip_recoverable_errors: bool) -> Result<MvtTile, MvtError>
    where
        B: Buf,
    {
        let pb = Tile::decode(buffer).map_err(|e| MvtError::Proto(e.to_string()))?;

        let layers = decode_each(
            pb.layers,
            skip_recoverable_errors,
            |layer| MvtLayer::decode(layer, skip_recoverable_errors),
            || None,
        )?;

        Ok(MvtTile { layers })
    }

    /// Returns the layer with the given name.
    pub fn layer(&self, name: &str) -> Option<&MvtLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

impl MvtLayer {
    fn decode(pb_layer: Layer, skip_recoverable_errors: bool) -> Result<Self, MvtError> {
        if pb_layer.version != 2 {
            return Err(MvtError::Generic(format!(
                "layer {} has unsupported version {}",
                pb_layer.name, pb_layer.version
            )));
        }

        let extent = pb_layer.extent.unwrap_or(DEFAULT_EXTENT);
        if extent == 0 {
            return Err(MvtError::Generic(format!(
                "layer {} has zero extent",
                pb_layer.name
            )));
        }

        let values = decode_each(
            pb_layer.values,
            skip_recoverable_errors,
            MvtValue::try_from,
            || Some(MvtValue::Unknown),
        )?;
        let keys = pb_layer.keys;
        let features = decode_each(
            pb_layer.features,
            skip_recoverable_errors,
            |feature| MvtFeature::decode(feature, extent, &keys, &values),
            || None,
        )?;

        Ok(MvtLayer {
            name: pb_layer.name,
            features,
            properties: keys,
            size: extent,
        })
    }
}

/// Decodes every item. With `skip_errors` a failed item is logged and replaced by `fallback()`,
/// or dropped if that is `None`.
fn decode_each<T, U>(
    items: Vec<T>,
    skip_errors: bool,
    mut decode: impl FnMut(T) -> Result<U, MvtError>,
    fallback: impl Fn() -> Option<U>,
) -> Result<Vec<U>, MvtError> {
    let mut decoded = Vec::with_capacity(items.len());
    for item in items {
        match decode(item) {
            Ok(value) => decoded.push(value),
            Err(err) if skip_errors => {
                log::warn!("Skipping invalid vector tile element: {err}");
                decoded.extend(fallback());
            }
            Err(err) => return Err(err),
        }
    }

    Ok(decoded)
}

impl TryFrom<Value> for MvtValue {
    type Error = MvtError;

    /// Exactly one of the value fields must be set.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut present = value
            .string_value
            .map(MvtValue::String)
            .into_iter()
            .chain(value.float_value.map(MvtValue::Float))
            .chain(value.double_value.map(MvtValue::Double))
            .chain(value.int_value.map(MvtValue::Int64))
            .chain(value.uint_value.map(MvtValue::Uint64))
            .chain(value.sint_value.map(MvtValue::Int64))
            .chain(value.bool_value.map(MvtValue::Bool));

        match (present.next(), present.next()) {
            (Some(value), None) => Ok(value),
            (None, _) => Err(MvtError::Generic("value has no field set".into())),
            (Some(_), Some(_)) => Err(MvtError::Generic("value has several fields set".into())),
        }
    }
}

impl MvtFeature {
    fn decode(
        pb_feature: Feature,
        extent: u32,
        keys: &[String],
        values: &[MvtValue],
    ) -> Result<MvtFeature, MvtError> {
        if pb_feature.tags.len() % 2 != 0 {
            return Err(MvtError::Generic("odd number of feature tags".into()));
        }

        let properties = pb_feature
            .tags
            .chunks_exact(2)
            .map(|pair| {
                let key = keys.get(pair[0] as usize).ok_or_else(|| {
                    MvtError::Generic(format!("tag key index {} is out of range", pair[0]))
                })?;
                let value = values.get(pair[1] as usize).ok_or_else(|| {
                    MvtError::Generic(format!("tag value index {} is out of range", pair[1]))
                })?;
                Ok((key.clone(), value.clone()))
            })
            .collect::<Result<HashMap<_, _>, MvtError>>()?;

        let commands = &pb_feature.geometry;
        let geometry = match pb_feature.r#type {
            Some(POINT) => MvtGeometry::Point(geometry::read_points(commands, extent)?),
            Some(LINE_STRING) => MvtGeometry::LineString(contour::read_contours(commands, extent)?),
            Some(POLYGON) => MvtGeometry::Polygon(MvtPolygon::read(commands, extent)?),
            other => {
                return Err(MvtError::Generic(format!(
                    "unsupported geometry type {other:?}"
                )))
            }
        };

        Ok(MvtFeature {
            id: pb_feature.id,
            properties,
            geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use geozero::mvt::tile::GeomType;

    use super::*;

    fn encode(tile: Tile) -> Vec<u8> {
        tile.encode_to_vec()
    }

    fn layer(name: &str, features: Vec<Feature>) -> Layer {
        Layer {
            version: 2,
            name: name.into(),
            features,
            keys: vec!["class".into(), "rank".into()],
            values: vec![
                Value {
                    string_value: Some("lake".into()),
                    ..Default::default()
                },
                Value {
                    int_value: Some(3),
                    ..Default::default()
                },
            ],
            extent: Some(4096),
        }
    }

    #[test]
    fn empty_buffer_is_empty_tile() {
        let tile = MvtTile::decode(&[][..], false).unwrap();
        assert!(tile.layers.is_empty());
    }

    #[test]
    fn garbage_is_proto_error() {
        let result = MvtTile::decode(&[0xff, 0xff, 0xff][..], false);
        assert!(matches!(result, Err(MvtError::Proto(_))));
    }

    #[test]
    fn decode_point_and_properties() {
        let feature = Feature {
            id: Some(7),
            tags: vec![0, 0, 1, 1],
            r#type: Some(GeomType::Point as i32),
            // MoveTo(1) to (2048, 1024)
            geometry: vec![9, 4096, 2048],
        };
        let bytes = encode(Tile {
            layers: vec![layer("water", vec![feature])],
        });

        let tile = MvtTile::decode(&mut Cursor::new(&bytes), false).unwrap();
        let layer = tile.layer("water").unwrap();
        assert_eq!(layer.size, 4096);

        let feature = &layer.features[0];
        assert_eq!(feature.id, Some(7));
        assert!(feature.properties["class"].eq_str("lake"));
        assert!(feature.properties["rank"].eq_str("3"));
        assert!(!feature.properties["rank"].eq_str("three"));
        assert_eq!(
            feature.geometry,
            MvtGeometry::Point(vec![Point::new(0.5, 0.25)])
        );
    }

    #[test]
    fn invalid_layer_version() {
        let mut invalid = layer("roads", vec![]);
        invalid.version = 1;
        let bytes = encode(Tile {
            layers: vec![invalid, layer("water", vec![])],
        });

        assert!(MvtTile::decode(&bytes[..], false).is_err());

        let tile = MvtTile::decode(&bytes[..], true).unwrap();
        assert_eq!(tile.layers.len(), 1);
        assert_eq!(tile.layers[0].name, "water");
    }

    #[test]
    fn point_with_line_to_is_rejected() {
        let feature = Feature {
            id: None,
            tags: vec![],
            r#type: Some(GeomType::Point as i32),
            geometry: vec![9, 2, 2, 10, 2, 2],
        };
        let bytes = encode(Tile {
            layers: vec![layer("poi", vec![feature])],
        });

        assert!(MvtTile::decode(&bytes[..], false).is_err());
        let tile = MvtTile::decode(&bytes[..], true).unwrap();
        assert!(tile.layers[0].features.is_empty());
    }

    #[test]
    fn ambiguous_value_is_unknown_when_skipping() {
        let mut with_bad_value = layer("water", vec![]);
        with_bad_value.values.push(Value {
            string_value: Some("x".into()),
            bool_value: Some(true),
            ..Default::default()
        });
        let bytes = encode(Tile {
            layers: vec![with_bad_value],
        });

        assert!(MvtTile::decode(&bytes[..], false).is_err());
        let tile = MvtTile::decode(&bytes[..], true).unwrap();
        assert_eq!(tile.layers.len(), 1);
    }
}
