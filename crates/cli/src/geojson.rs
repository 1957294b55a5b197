//! GeoJSON input and output.
//!
//! Lightweight serde models covering what the CLI needs: point and polygon
//! geometries, flat properties, and the legacy `crs` member for declaring a
//! reference frame. Output is written feature by feature so the record
//! sequence is never collected.

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tessera_core::{AttributeValue, BoundarySource, Feature, PointCollection, PointFeature, CRS};

// ---------------------------------------------------------------------------
// Serde models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoJsonCollection {
    #[serde(rename = "type")]
    pub type_: String,

    /// Legacy named CRS (`{"type": "name", "properties": {"name": ...}}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,

    #[serde(default)]
    pub features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub geometry: Option<GeoJsonGeometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    /// Anything else is carried through but ignored
    #[serde(other)]
    Unsupported,
}

impl GeoJsonGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            GeoJsonGeometry::Point { .. } => "Point",
            GeoJsonGeometry::MultiPoint { .. } => "MultiPoint",
            GeoJsonGeometry::Polygon { .. } => "Polygon",
            GeoJsonGeometry::MultiPolygon { .. } => "MultiPolygon",
            GeoJsonGeometry::Unsupported => "other",
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parse a FeatureCollection from disk
pub fn read_collection(path: &Path) -> Result<GeoJsonCollection> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let collection: GeoJsonCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON from {}", path.display()))?;
    if collection.type_ != "FeatureCollection" {
        anyhow::bail!("{}: expected a FeatureCollection, got {}", path.display(), collection.type_);
    }
    Ok(collection)
}

/// Declared frame of a collection, if any
pub fn collection_frame(collection: &GeoJsonCollection) -> Result<Option<CRS>> {
    let name = collection
        .crs
        .as_ref()
        .and_then(|c| c.get("properties"))
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str);
    match name {
        Some(n) => Ok(Some(CRS::parse(n)?)),
        None => Ok(None),
    }
}

/// Read point features. MultiPoints are split into one feature per point
/// sharing the same properties; features of other types are ignored.
pub fn read_points(path: &Path) -> Result<PointCollection> {
    let collection = read_collection(path)?;
    let frame = collection_frame(&collection)?;

    let mut points = Vec::new();
    for feature in collection.features {
        let properties = feature.properties.map(convert_properties).unwrap_or_default();
        let id = feature.id.as_ref().map(id_to_string);
        let coords = match feature.geometry {
            Some(GeoJsonGeometry::Point { coordinates }) => vec![coordinates],
            Some(GeoJsonGeometry::MultiPoint { coordinates }) => coordinates,
            _ => continue,
        };
        for c in coords {
            let (x, y) = position(&c);
            points.push(PointFeature {
                location: Point::new(x, y),
                properties: properties.clone(),
                id: id.clone(),
            });
        }
    }

    let mut out = PointCollection::new(points);
    out.frame = frame;
    Ok(out)
}

/// Read polygon features as a boundary source
pub fn read_boundary(path: &Path) -> Result<BoundarySource> {
    let collection = read_collection(path)?;
    let frame = collection_frame(&collection)?;

    let geoms = collection
        .features
        .into_iter()
        .filter_map(|f| f.geometry)
        .filter_map(|g| match g {
            GeoJsonGeometry::Polygon { coordinates } => Some(Geometry::Polygon(polygon(&coordinates))),
            GeoJsonGeometry::MultiPolygon { coordinates } => Some(Geometry::MultiPolygon(
                MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()),
            )),
            _ => None,
        });

    let mut boundary = BoundarySource::from_geometries(geoms);
    boundary.frame = frame;
    Ok(boundary)
}

/// Missing ordinates read as NaN so the point is later skipped, not dropped
/// silently here.
fn position(c: &[f64]) -> (f64, f64) {
    (
        c.first().copied().unwrap_or(f64::NAN),
        c.get(1).copied().unwrap_or(f64::NAN),
    )
}

fn ring(coords: &[Vec<f64>]) -> LineString<f64> {
    LineString::new(
        coords
            .iter()
            .map(|c| {
                let (x, y) = position(c);
                Coord { x, y }
            })
            .collect(),
    )
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, holes)) => Polygon::new(ring(exterior), holes.iter().map(|h| ring(h)).collect()),
        None => Polygon::new(LineString::new(vec![]), vec![]),
    }
}

fn id_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn convert_properties(map: Map<String, Value>) -> HashMap<String, AttributeValue> {
    map.into_iter().map(|(k, v)| (k, json_to_attribute(v))).collect()
}

fn json_to_attribute(v: Value) -> AttributeValue {
    match v {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map(AttributeValue::Float).unwrap_or(AttributeValue::Null),
        },
        Value::String(s) => AttributeValue::String(s),
        // nested values are kept as their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn attribute_to_json(v: &AttributeValue) -> Value {
    match v {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => Value::from(*i),
        // non-finite floats have no JSON form
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn ring_coords(ls: &LineString<f64>) -> Vec<Vec<f64>> {
    ls.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_coords(p: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(ring_coords)
        .collect()
}

fn geometry_to_json(g: &Geometry<f64>) -> Option<GeoJsonGeometry> {
    match g {
        Geometry::Point(p) => Some(GeoJsonGeometry::Point { coordinates: vec![p.x(), p.y()] }),
        Geometry::Polygon(p) => Some(GeoJsonGeometry::Polygon { coordinates: polygon_coords(p) }),
        Geometry::MultiPolygon(mp) => Some(GeoJsonGeometry::MultiPolygon {
            coordinates: mp.iter().map(polygon_coords).collect(),
        }),
        Geometry::Rect(r) => Some(GeoJsonGeometry::Polygon { coordinates: polygon_coords(&r.to_polygon()) }),
        _ => None,
    }
}

/// Convert one record to its GeoJSON form. Properties are written in
/// sorted key order.
pub fn to_geojson_feature(feature: &Feature) -> GeoJsonFeature {
    let mut keys: Vec<&String> = feature.properties.keys().collect();
    keys.sort();
    let properties: Map<String, Value> = keys
        .into_iter()
        .map(|k| (k.clone(), attribute_to_json(&feature.properties[k])))
        .collect();

    GeoJsonFeature {
        type_: "Feature".to_string(),
        id: feature.id.clone().map(Value::String),
        geometry: feature.geometry.as_ref().and_then(geometry_to_json),
        properties: Some(properties),
    }
}

fn crs_member(frame: &CRS) -> Value {
    let name = match frame.epsg() {
        Some(code) => format!("urn:ogc:def:crs:EPSG::{}", code),
        None => frame.identifier(),
    };
    serde_json::json!({ "type": "name", "properties": { "name": name } })
}

/// Stream records into a FeatureCollection file. Returns the number of
/// features written.
pub fn write_features<I>(path: &Path, features: I, frame: Option<&CRS>) -> Result<usize>
where
    I: IntoIterator<Item = Feature>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);

    write!(w, "{{\"type\":\"FeatureCollection\",")?;
    if let Some(f) = frame {
        write!(w, "\"crs\":")?;
        serde_json::to_writer(&mut w, &crs_member(f))?;
        write!(w, ",")?;
    }
    write!(w, "\"features\":[")?;

    let mut n = 0;
    for feature in features {
        if n > 0 {
            write!(w, ",")?;
        }
        writeln!(w)?;
        serde_json::to_writer(&mut w, &to_geojson_feature(&feature))?;
        n += 1;
    }
    writeln!(w, "\n]}}")?;
    w.flush().context("Failed to write output")?;
    Ok(n)
}
