//! Point-to-cell aggregation
//!
//! Cells are indexed by envelope once; points are then streamed through one
//! at a time and never collected. Each valid point is tested against its
//! candidate cells in row-major order and credited to the first cell that
//! contains it.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use tessera_core::{DiagnosticNotice, Diagnostics, PointFeature, ProgressMonitor};
use tracing::{debug, info, warn};

use super::weight::WeightEvaluator;
use crate::spatial_index::EnvelopeIndex;
use crate::tessellation::Cell;

/// Aggregation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateParams {
    /// Drop cells that received no points
    pub only_valid_grid: bool,
    /// Attribute whose value labels each point for per-case counts
    pub case_field: Option<String>,
    /// Report progress every this many points (0 disables reporting)
    pub progress_interval: u64,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            only_valid_grid: false,
            case_field: None,
            progress_interval: 10_000,
        }
    }
}

/// How an aggregation pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationStatus {
    Completed,
    /// Stopped early on request; cells hold partial results
    Cancelled,
}

/// Point counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    /// Points pulled from the input
    pub points_seen: u64,
    /// Points credited to a cell
    pub points_matched: u64,
    /// Points ignored for non-finite coordinates
    pub points_skipped: u64,
    /// Valid points outside every cell
    pub points_unmatched: u64,
}

/// What happened to a single point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    /// Credited to the cell at this position in the lattice
    Matched(usize),
    Unmatched,
    Skipped,
}

/// Result of an aggregation pass
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Surviving cells, row-major
    pub cells: Vec<Cell>,
    pub stats: AggregationStats,
    pub status: AggregationStatus,
    pub diagnostics: Diagnostics,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.status == AggregationStatus::Completed
    }
}

/// Accumulates points into a fixed set of cells
#[derive(Debug)]
pub struct SpatialAggregator {
    cells: Vec<Cell>,
    index: EnvelopeIndex,
    params: AggregateParams,
    stats: AggregationStats,
}

impl SpatialAggregator {
    /// Take ownership of the lattice and build its index.
    ///
    /// The index is complete before the first point can be added.
    pub fn new(cells: Vec<Cell>, params: AggregateParams) -> Self {
        let index = EnvelopeIndex::build(
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| (i, c.shape().bounding_rect())),
        );
        debug!("indexed {} cells", index.len());
        Self {
            cells,
            index,
            params,
            stats: AggregationStats::default(),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    /// Credit one point to the first cell containing it
    pub fn add_point<W>(&mut self, point: &PointFeature, weight: &W) -> PointOutcome
    where
        W: WeightEvaluator + ?Sized,
    {
        self.stats.points_seen += 1;

        if !point.is_valid() {
            self.stats.points_skipped += 1;
            return PointOutcome::Skipped;
        }

        let coord = point.coord();
        let hit = self
            .index
            .candidates_at(coord)
            .into_iter()
            .find(|&i| self.cells[i].shape().contains_coord(coord));

        match hit {
            Some(i) => {
                let w = weight.evaluate(point);
                let label = self.params.case_field.as_deref().map(|f| point.label(f));
                self.cells[i].aggregates_mut().add(w, label);
                self.stats.points_matched += 1;
                PointOutcome::Matched(i)
            }
            None => {
                self.stats.points_unmatched += 1;
                PointOutcome::Unmatched
            }
        }
    }

    /// Stream `points` through the aggregator, then finish.
    ///
    /// `monitor` is polled before every point; on cancellation the cells
    /// seen so far are returned with [`AggregationStatus::Cancelled`].
    pub fn run<I, W, M>(mut self, points: I, weight: &W, monitor: &M) -> Aggregation
    where
        I: IntoIterator,
        I::Item: Borrow<PointFeature>,
        W: WeightEvaluator + ?Sized,
        M: ProgressMonitor + ?Sized,
    {
        let interval = self.params.progress_interval;
        let mut status = AggregationStatus::Completed;

        for point in points {
            if monitor.is_cancelled() {
                status = AggregationStatus::Cancelled;
                break;
            }
            self.add_point(point.borrow(), weight);
            if interval > 0 && self.stats.points_seen % interval == 0 {
                monitor.progress(self.stats.points_seen);
            }
        }
        monitor.progress(self.stats.points_seen);

        self.finish(status)
    }

    /// Apply pruning and collect notices
    pub fn finish(self, status: AggregationStatus) -> Aggregation {
        let stats = self.stats;
        let mut diagnostics = Diagnostics::new();

        if stats.points_skipped > 0 {
            diagnostics.push(DiagnosticNotice::SkippedPoints { count: stats.points_skipped });
        }
        if stats.points_unmatched > 0 {
            diagnostics.push(DiagnosticNotice::UnmatchedPoints { count: stats.points_unmatched });
        }
        if status == AggregationStatus::Cancelled {
            diagnostics.push(DiagnosticNotice::Cancelled { points_processed: stats.points_seen });
        }
        for notice in diagnostics.iter() {
            warn!("{}", notice);
        }

        let mut cells = self.cells;
        if self.params.only_valid_grid {
            cells.retain(|c| c.count() > 0);
        }

        info!(
            "aggregated {} of {} points into {} cells",
            stats.points_matched,
            stats.points_seen,
            cells.len()
        );

        Aggregation { cells, stats, status, diagnostics }
    }
}

/// Aggregate a point stream into `cells`.
///
/// # Arguments
/// * `cells` - Lattice cells, row-major
/// * `points` - Point stream, consumed once
/// * `weight` - Per-point weight
/// * `params` - Pruning and case options
/// * `monitor` - Progress and cancellation handle
pub fn aggregate<I, W, M>(
    cells: Vec<Cell>,
    points: I,
    weight: &W,
    params: &AggregateParams,
    monitor: &M,
) -> Aggregation
where
    I: IntoIterator,
    I::Item: Borrow<PointFeature>,
    W: WeightEvaluator + ?Sized,
    M: ProgressMonitor + ?Sized,
{
    SpatialAggregator::new(cells, params.clone()).run(points, weight, monitor)
}
