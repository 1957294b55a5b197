//! Vector data structures
//!
//! - `Feature`: any geometry plus attributes, used for output cell records
//! - `PointFeature`: a located input record, read-only to the engine
//! - `BoundarySource`: polygon set restricting which lattice cells survive

use geo::{Coord, MultiPolygon, Point, Polygon};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::crs::CRS;
use crate::extent::Extent;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value.
    ///
    /// Strings are parsed after trimming. `Null`, booleans, unparseable
    /// strings and non-finite floats have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            AttributeValue::Int(i) => *i as f64,
            AttributeValue::Float(f) => *f,
            AttributeValue::String(s) => s.trim().parse::<f64>().ok()?,
            AttributeValue::Null | AttributeValue::Bool(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(AttributeValue::Int).unwrap_or(AttributeValue::Float(v as f64))
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// A located input record.
///
/// The engine only reads these; the caller's feature store owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub location: Point<f64>,
    pub properties: HashMap<String, AttributeValue>,
    pub id: Option<String>,
}

impl PointFeature {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            location: Point::new(x, y),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn x(&self) -> f64 {
        self.location.x()
    }

    pub fn y(&self) -> f64 {
        self.location.y()
    }

    pub fn coord(&self) -> Coord<f64> {
        self.location.0
    }

    /// Both coordinates are finite
    pub fn is_valid(&self) -> bool {
        self.x().is_finite() && self.y().is_finite()
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Case label read from `field`; missing or null values map to `""`.
    pub fn label(&self, field: &str) -> String {
        self.properties
            .get(field)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

/// Point features that came with a declared reference frame
#[derive(Debug, Clone, Default)]
pub struct PointCollection {
    pub points: Vec<PointFeature>,
    pub frame: Option<CRS>,
}

impl PointCollection {
    pub fn new(points: Vec<PointFeature>) -> Self {
        Self { points, frame: None }
    }

    pub fn with_frame(mut self, frame: CRS) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounds of all finite point locations
    pub fn bounds(&self) -> Option<geo::Rect<f64>> {
        Extent::bounds_of(self.points.iter().map(|p| p.coord()))
    }
}

/// Optional polygon set restricting which cells are kept
#[derive(Debug, Clone, Default)]
pub struct BoundarySource {
    pub polygons: Vec<Polygon<f64>>,
    pub frame: Option<CRS>,
}

impl BoundarySource {
    pub fn new(polygons: Vec<Polygon<f64>>) -> Self {
        Self { polygons, frame: None }
    }

    pub fn with_frame(mut self, frame: CRS) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Collect the polygonal parts of arbitrary geometries.
    ///
    /// Multipolygons are split into their parts, rectangles and triangles are
    /// converted, and everything else is ignored.
    pub fn from_geometries<I>(geoms: I) -> Self
    where
        I: IntoIterator<Item = Geometry<f64>>,
    {
        let mut polygons = Vec::new();
        for g in geoms {
            collect_polygons(g, &mut polygons);
        }
        Self::new(polygons)
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn bounds(&self) -> Option<geo::Rect<f64>> {
        Extent::from_geometries(self.polygons.iter())
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons.clone())
    }
}

fn collect_polygons(geom: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geom {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self { features: iter.into_iter().collect() }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
