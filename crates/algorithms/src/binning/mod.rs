//! Point binning
//!
//! End-to-end pipeline: resolve extent and cell size, generate the lattice,
//! stream points into it and assemble the output records.
//!
//! ```text
//! bin_points(params, boundary, points, monitor)
//!   -> resolve -> generate -> aggregate -> assemble
//! ```

pub mod aggregate;
pub mod assemble;
pub mod weight;

pub use aggregate::{
    aggregate, AggregateParams, Aggregation, AggregationStats, AggregationStatus, PointOutcome,
    SpatialAggregator,
};
pub use assemble::{assemble, cell_to_feature, AssembleParams, CellRecords};
pub use weight::{ArithOp, UnitWeight, Weight, WeightEvaluator, WeightExpr};

use geo::Rect;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tessera_core::crs::ensure_same_frame;
use tessera_core::{
    BoundarySource, DiagnosticNotice, Diagnostics, Extent, PointCollection, PointFeature,
    ProgressMonitor, Result, CRS,
};
use tracing::{debug, info, warn};

use crate::tessellation::{
    generate, resolve, Cell, CellSizeRequest, CellSpec, LatticeParams, TilingKind,
};

/// Options for one binning run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningParams {
    pub kind: TilingKind,
    pub size: CellSizeRequest,
    /// Area to cover; derived from the inputs when absent
    pub extent: Option<Extent>,
    pub lattice: LatticeParams,
    pub aggregate: AggregateParams,
    pub assemble: AssembleParams,
    /// Weight formula; unit weights when absent
    pub weight: Option<String>,
}

/// A single-pass point stream with optional frame and bounds.
///
/// `bounds` saves a buffering pass when the extent has to be derived from
/// the points. Without it the stream is collected once, its bounds taken,
/// and the buffered points binned.
#[derive(Debug, Clone)]
pub struct PointSource<I> {
    pub points: I,
    pub frame: Option<CRS>,
    pub bounds: Option<Rect<f64>>,
}

impl<I> PointSource<I> {
    pub fn new(points: I) -> Self {
        Self { points, frame: None, bounds: None }
    }

    pub fn with_frame(mut self, frame: Option<CRS>) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_bounds(mut self, bounds: Option<Rect<f64>>) -> Self {
        self.bounds = bounds;
        self
    }
}

impl<'a> PointSource<std::slice::Iter<'a, PointFeature>> {
    /// Borrow a collection, carrying its frame and bounds along
    pub fn from_collection(collection: &'a PointCollection) -> Self {
        PointSource {
            points: collection.points.iter(),
            frame: collection.frame.clone(),
            bounds: collection.bounds(),
        }
    }
}

/// Everything a binning run produces
#[derive(Debug)]
pub struct BinningOutput {
    /// Lazy row-major output records
    pub records: CellRecords,
    pub stats: AggregationStats,
    pub status: AggregationStatus,
    pub diagnostics: Diagnostics,
    /// Extent actually tiled
    pub extent: Extent,
    /// Sizing actually used
    pub spec: CellSpec,
}

impl BinningOutput {
    pub fn is_complete(&self) -> bool {
        self.status == AggregationStatus::Completed
    }
}

/// Lattice cells with the extent and sizing they were built from
#[derive(Debug, Clone)]
pub struct Lattice {
    pub cells: Vec<Cell>,
    pub extent: Extent,
    pub spec: CellSpec,
    pub diagnostics: Diagnostics,
}

/// Generate a lattice without binning anything into it.
///
/// The extent must come from `params.extent` or the boundary.
pub fn generate_lattice(params: &BinningParams, boundary: Option<&BoundarySource>) -> Result<Lattice> {
    let frame = ensure_same_frame([
        params.extent.as_ref().and_then(|e| e.frame()),
        boundary.and_then(|b| b.frame.as_ref()),
    ])?;
    let resolved = resolve(params.kind, &params.size, params.extent.as_ref(), None, boundary)?;
    let extent = attach_frame(resolved.extent, frame);
    let cells = generate(&extent, &resolved.spec, boundary, &params.lattice)?;

    let mut diagnostics = resolved.diagnostics;
    if cells.is_empty() {
        warn!("{}", DiagnosticNotice::EmptyLattice);
        diagnostics.push(DiagnosticNotice::EmptyLattice);
    }
    info!("generated {} {} cells", cells.len(), resolved.spec.kind);

    Ok(Lattice { cells, extent, spec: resolved.spec, diagnostics })
}

/// Bin a point stream into a fresh lattice.
///
/// # Arguments
/// * `params` - Tiling, sizing and output options
/// * `boundary` - Optional polygons restricting the lattice
/// * `source` - Points, consumed once
/// * `monitor` - Progress and cancellation handle
///
/// # Errors
/// Configuration problems (frame mismatch, missing extent, bad sizing, bad
/// weight formula) fail before any point is read. Bad points only produce
/// diagnostics.
pub fn bin_points<I, M>(
    params: &BinningParams,
    boundary: Option<&BoundarySource>,
    source: PointSource<I>,
    monitor: &M,
) -> Result<BinningOutput>
where
    I: IntoIterator,
    I::Item: Borrow<PointFeature>,
    M: ProgressMonitor + ?Sized,
{
    let PointSource { points, frame: source_frame, bounds } = source;
    let frame = ensure_same_frame([
        source_frame.as_ref(),
        params.extent.as_ref().and_then(|e| e.frame()),
        boundary.and_then(|b| b.frame.as_ref()),
    ])?;
    let weight = Weight::from_formula(params.weight.as_deref())?;

    if params.extent.is_none() && bounds.is_none() {
        let buffered: Vec<I::Item> = points.into_iter().collect();
        let bounds = Extent::bounds_of(buffered.iter().map(|p| p.borrow().coord()));
        debug!("buffered {} points to derive the extent", buffered.len());
        return bin_within(params, boundary, buffered, bounds, frame, &weight, monitor);
    }
    bin_within(params, boundary, points, bounds, frame, &weight, monitor)
}

/// Resolve, generate, aggregate and assemble once the inputs are checked
fn bin_within<I, M>(
    params: &BinningParams,
    boundary: Option<&BoundarySource>,
    points: I,
    bounds: Option<Rect<f64>>,
    frame: Option<&CRS>,
    weight: &Weight,
    monitor: &M,
) -> Result<BinningOutput>
where
    I: IntoIterator,
    I::Item: Borrow<PointFeature>,
    M: ProgressMonitor + ?Sized,
{
    let resolved = resolve(params.kind, &params.size, params.extent.as_ref(), bounds, boundary)?;
    let extent = attach_frame(resolved.extent, frame);
    let spec = resolved.spec;
    let mut diagnostics = resolved.diagnostics;

    let cells = generate(&extent, &spec, boundary, &params.lattice)?;
    if cells.is_empty() {
        warn!("{}", DiagnosticNotice::EmptyLattice);
        diagnostics.push(DiagnosticNotice::EmptyLattice);
    }

    let aggregation = aggregate(cells, points, weight, &params.aggregate, monitor);
    diagnostics.extend(aggregation.diagnostics);

    Ok(BinningOutput {
        records: assemble(aggregation.cells, &params.assemble),
        stats: aggregation.stats,
        status: aggregation.status,
        diagnostics,
        extent,
        spec,
    })
}

fn attach_frame(extent: Extent, frame: Option<&CRS>) -> Extent {
    match (extent.frame(), frame) {
        (None, Some(f)) => extent.with_frame(f.clone()),
        _ => extent,
    }
}
