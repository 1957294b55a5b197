//! Output record assembly
//!
//! Turns aggregated cells into attribute-carrying polygon features. Records
//! are produced lazily in cell order so large lattices can be written
//! without materializing every feature.

use geo::Geometry;
use serde::{Deserialize, Serialize};
use tessera_core::{AttributeValue, Feature, FeatureCollection};

use crate::tessellation::Cell;

pub const FIELD_COUNT: &str = "count";
pub const FIELD_WEIGHT_SUM: &str = "weightSum";
pub const FIELD_WEIGHT_MIN: &str = "weightMin";
pub const FIELD_WEIGHT_MAX: &str = "weightMax";
pub const FIELD_WEIGHT_MEAN: &str = "weightMean";
pub const FIELD_ROW: &str = "row";
pub const FIELD_COL: &str = "col";
pub const FIELD_ID: &str = "id";
pub const FIELD_CENTROID_X: &str = "centroid_x";
pub const FIELD_CENTROID_Y: &str = "centroid_y";
/// Prefix of per-case count attributes
pub const CASE_PREFIX: &str = "case:";

/// Which optional attributes to write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssembleParams {
    pub include_row_col: bool,
    pub include_id: bool,
    pub include_centroid: bool,
    /// Write weightMin, weightMax and weightMean
    pub weight_stats: bool,
}

impl Default for AssembleParams {
    fn default() -> Self {
        Self {
            include_row_col: true,
            include_id: true,
            include_centroid: false,
            weight_stats: false,
        }
    }
}

/// Build the output feature for one cell.
///
/// `count` and `weightSum` are always present.
pub fn cell_to_feature(cell: &Cell, params: &AssembleParams) -> Feature {
    let aggregates = cell.aggregates();
    let mut feature = Feature::new(Geometry::Polygon(cell.shape().to_polygon()));
    feature.id = Some(cell.id().to_string());

    feature.set_property(FIELD_COUNT, aggregates.count);
    feature.set_property(FIELD_WEIGHT_SUM, aggregates.weight_sum);

    if params.include_row_col {
        feature.set_property(FIELD_ROW, cell.row() as u64);
        feature.set_property(FIELD_COL, cell.col() as u64);
    }
    if params.include_id {
        feature.set_property(FIELD_ID, cell.id().to_string());
    }
    if params.weight_stats {
        let (min, max) = match aggregates.weight_range() {
            Some((lo, hi)) => (AttributeValue::Float(lo), AttributeValue::Float(hi)),
            None => (AttributeValue::Null, AttributeValue::Null),
        };
        feature.set_property(FIELD_WEIGHT_MIN, min);
        feature.set_property(FIELD_WEIGHT_MAX, max);
        feature.set_property(
            FIELD_WEIGHT_MEAN,
            aggregates
                .weight_mean()
                .map(AttributeValue::Float)
                .unwrap_or(AttributeValue::Null),
        );
    }
    if params.include_centroid {
        let c = cell.shape().centroid();
        feature.set_property(FIELD_CENTROID_X, c.x);
        feature.set_property(FIELD_CENTROID_Y, c.y);
    }
    for (label, n) in &aggregates.cases {
        feature.set_property(format!("{}{}", CASE_PREFIX, label), *n);
    }

    feature
}

/// Lazy, finite, row-major sequence of output records
#[derive(Debug)]
pub struct CellRecords {
    cells: std::vec::IntoIter<Cell>,
    params: AssembleParams,
}

impl CellRecords {
    pub fn new(cells: Vec<Cell>, params: AssembleParams) -> Self {
        Self { cells: cells.into_iter(), params }
    }

    /// Drain the remaining records into a collection
    pub fn into_collection(self) -> FeatureCollection {
        self.collect()
    }
}

impl Iterator for CellRecords {
    type Item = Feature;

    fn next(&mut self) -> Option<Feature> {
        self.cells.next().map(|c| cell_to_feature(&c, &self.params))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl ExactSizeIterator for CellRecords {}

/// Wrap cells as output records
pub fn assemble(cells: Vec<Cell>, params: &AssembleParams) -> CellRecords {
    CellRecords::new(cells, params.clone())
}
