//! End-to-end binning scenarios.
//!
//! Each test drives the public pipeline (`bin_points` / `generate_lattice`)
//! the way a caller would and checks the emitted records.

use geo::{LineString, Polygon};
use tessera_algorithms::binning::{
    bin_points, generate_lattice, AggregateParams, AggregationStatus, AssembleParams,
    BinningParams, PointSource,
};
use tessera_algorithms::tessellation::{Cell, CellSizeRequest, LatticeParams, TilingKind};
use tessera_core::{
    AttributeValue, BoundarySource, CancellationToken, DiagnosticNotice, Error, Extent, Feature,
    NullMonitor, PointCollection, PointFeature, ProgressMonitor, CRS,
};

// ── Helpers ───────────────────────────────────────────────────────────

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}

fn int(f: &Feature, key: &str) -> i64 {
    match f.get_property(key) {
        Some(AttributeValue::Int(v)) => *v,
        other => panic!("{key} is not an integer: {other:?}"),
    }
}

fn float(f: &Feature, key: &str) -> f64 {
    match f.get_property(key) {
        Some(AttributeValue::Float(v)) => *v,
        other => panic!("{key} is not a float: {other:?}"),
    }
}

fn ten_by_ten() -> BinningParams {
    BinningParams {
        kind: TilingKind::Rectangle,
        size: CellSizeRequest::counts(10, 10),
        extent: Some(Extent::new(0.0, 0.0, 100.0, 100.0).unwrap()),
        ..Default::default()
    }
}

fn three_points() -> Vec<PointFeature> {
    vec![
        PointFeature::new(5.0, 5.0),
        PointFeature::new(5.0, 5.0),
        PointFeature::new(95.0, 95.0),
    ]
}

// ── Scenarios ─────────────────────────────────────────────────────────

#[test]
fn rectangle_counts_hundred_cells() {
    let out = bin_points(&ten_by_ten(), None, PointSource::new(three_points()), &NullMonitor).unwrap();
    assert!(out.is_complete());

    let records: Vec<Feature> = out.records.collect();
    assert_eq!(records.len(), 100);

    for f in &records {
        let (row, col) = (int(f, "row"), int(f, "col"));
        let expected = match (row, col) {
            (0, 0) => 2,
            (9, 9) => 1,
            _ => 0,
        };
        assert_eq!(int(f, "count"), expected, "cell r{row}c{col}");
        assert_eq!(float(f, "weightSum"), expected as f64);
    }
}

#[test]
fn rectangle_pruned_to_populated_cells() {
    let params = BinningParams {
        aggregate: AggregateParams { only_valid_grid: true, ..Default::default() },
        ..ten_by_ten()
    };
    let out = bin_points(&params, None, PointSource::new(three_points()), &NullMonitor).unwrap();
    let ids: Vec<Option<String>> = out.records.map(|f| f.id).collect();
    assert_eq!(ids, vec![Some("r0c0".to_string()), Some("r9c9".to_string())]);
}

#[test]
fn hexagon_without_points() {
    let params = BinningParams {
        kind: TilingKind::HexagonPointy,
        size: CellSizeRequest::size(2.0),
        extent: Some(Extent::new(0.0, 0.0, 10.0, 10.0).unwrap()),
        ..Default::default()
    };
    let points: Vec<PointFeature> = Vec::new();
    let out = bin_points(&params, None, PointSource::new(points), &NullMonitor).unwrap();

    let records: Vec<Feature> = out.records.collect();
    assert!(!records.is_empty());
    for f in &records {
        assert_eq!(int(f, "count"), 0);
        assert_eq!(float(f, "weightSum"), 0.0);
    }

    let pruned = BinningParams {
        aggregate: AggregateParams { only_valid_grid: true, ..Default::default() },
        ..params
    };
    let points: Vec<PointFeature> = Vec::new();
    let out = bin_points(&pruned, None, PointSource::new(points), &NullMonitor).unwrap();
    assert_eq!(out.records.count(), 0);
}

#[test]
fn boundary_inside_versus_intersecting() {
    let boundary = BoundarySource::new(vec![square(0.0, 0.0, 50.0, 100.0)]);

    let mut params = ten_by_ten();
    params.lattice = LatticeParams { boundary_inside: true, ..Default::default() };
    let inside = generate_lattice(&params, Some(&boundary)).unwrap();
    assert_eq!(inside.cells.len(), 50);
    assert!(inside.cells.iter().all(|c| c.col() < 5));

    params.lattice.boundary_inside = false;
    let touching = generate_lattice(&params, Some(&boundary)).unwrap();
    assert_eq!(touching.cells.len(), 60);
    assert!(touching.cells.len() >= inside.cells.len());
}

#[test]
fn boundary_outside_extent_gives_empty_lattice() {
    let boundary = BoundarySource::new(vec![square(500.0, 500.0, 600.0, 600.0)]);
    let out = bin_points(
        &ten_by_ten(),
        Some(&boundary),
        PointSource::new(three_points()),
        &NullMonitor,
    )
    .unwrap();

    assert_eq!(out.records.len(), 0);
    assert_eq!(out.stats.points_unmatched, 3);
    assert!(out.diagnostics.iter().any(|n| *n == DiagnosticNotice::EmptyLattice));
}

#[test]
fn extent_derived_from_boundary() {
    let boundary = BoundarySource::new(vec![square(10.0, 20.0, 30.0, 60.0)]);
    let params = BinningParams {
        size: CellSizeRequest::size(10.0),
        ..Default::default()
    };
    let lattice = generate_lattice(&params, Some(&boundary)).unwrap();
    assert_eq!(lattice.extent.min_x(), 10.0);
    assert_eq!(lattice.extent.max_y(), 60.0);
    assert_eq!(lattice.cells.len(), 2 * 4);
}

#[test]
fn mismatched_frames_rejected() {
    let boundary = BoundarySource::new(vec![square(0.0, 0.0, 50.0, 100.0)]).with_frame(CRS::from_epsg(4326));
    let points = PointCollection::new(three_points()).with_frame(CRS::from_epsg(3857));

    let err = bin_points(
        &ten_by_ten(),
        Some(&boundary),
        PointSource::from_collection(&points),
        &NullMonitor,
    )
    .unwrap_err();
    assert!(matches!(err, Error::CoordinateFrameMismatch(_, _)));
    assert!(err.is_configuration());
}

#[test]
fn invalid_sizes_rejected() {
    let mut params = ten_by_ten();
    params.size = CellSizeRequest::counts(10, 0);
    assert!(matches!(
        generate_lattice(&params, None),
        Err(Error::InvalidSize { .. })
    ));

    params.size = CellSizeRequest::dimensions(-1.0, 5.0);
    assert!(matches!(
        generate_lattice(&params, None),
        Err(Error::InvalidSize { .. })
    ));
}

#[test]
fn missing_extent_rejected() {
    let params = BinningParams::default();
    assert!(matches!(generate_lattice(&params, None), Err(Error::MissingExtent)));
}

#[test]
fn skipped_and_unmatched_points_reported() {
    let points = vec![
        PointFeature::new(f64::NAN, 5.0),
        PointFeature::new(250.0, 5.0),
        PointFeature::new(5.0, 5.0),
    ];
    let out = bin_points(&ten_by_ten(), None, PointSource::new(points), &NullMonitor).unwrap();
    assert!(out.is_complete());
    assert_eq!(out.stats.points_skipped, 1);
    assert_eq!(out.stats.points_unmatched, 1);
    assert_eq!(out.stats.points_matched, 1);
    let notices = out.diagnostics.into_vec();
    assert!(notices.contains(&DiagnosticNotice::SkippedPoints { count: 1 }));
    assert!(notices.contains(&DiagnosticNotice::UnmatchedPoints { count: 1 }));
}

#[test]
fn weight_formula_and_stats() {
    let points = vec![
        PointFeature::new(1.0, 1.0).with_property("pop", 10.0),
        PointFeature::new(2.0, 2.0).with_property("pop", 30.0),
        PointFeature::new(3.0, 3.0).with_property("pop", "n/a"),
    ];
    let params = BinningParams {
        weight: Some("pop / 10".into()),
        assemble: AssembleParams { weight_stats: true, ..Default::default() },
        ..ten_by_ten()
    };
    let out = bin_points(&params, None, PointSource::new(points), &NullMonitor).unwrap();
    let first = out.records.into_iter().next().unwrap();
    assert_eq!(int(&first, "count"), 3);
    assert_eq!(float(&first, "weightSum"), 4.0);
    assert_eq!(float(&first, "weightMin"), 0.0);
    assert_eq!(float(&first, "weightMax"), 3.0);
}

#[test]
fn case_field_breakdown() {
    let points = vec![
        PointFeature::new(5.0, 5.0).with_property("type", "oak"),
        PointFeature::new(6.0, 6.0).with_property("type", "pine"),
        PointFeature::new(7.0, 7.0).with_property("type", "oak"),
        PointFeature::new(8.0, 8.0),
    ];
    let params = BinningParams {
        aggregate: AggregateParams { case_field: Some("type".into()), ..Default::default() },
        ..ten_by_ten()
    };
    let out = bin_points(&params, None, PointSource::new(points), &NullMonitor).unwrap();
    let first = out.records.into_iter().next().unwrap();
    assert_eq!(int(&first, "case:oak"), 2);
    assert_eq!(int(&first, "case:pine"), 1);
    assert_eq!(int(&first, "case:"), 1);
}

struct CancelAt {
    token: CancellationToken,
    at: u64,
}

impl ProgressMonitor for CancelAt {
    fn progress(&self, processed: u64) {
        self.token.progress(processed);
        if processed >= self.at {
            self.token.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[test]
fn cancellation_yields_partial_result() {
    let points = (0..1000).map(|i| PointFeature::new((i % 100) as f64 + 0.5, 50.5));
    let params = BinningParams {
        aggregate: AggregateParams { progress_interval: 100, ..Default::default() },
        ..ten_by_ten()
    };
    let monitor = CancelAt { token: CancellationToken::new(), at: 300 };
    let out = bin_points(&params, None, PointSource::new(points), &monitor).unwrap();

    assert_eq!(out.status, AggregationStatus::Cancelled);
    assert_eq!(out.stats.points_seen, 300);
    assert_eq!(monitor.token.processed(), 300);
    assert!(out
        .diagnostics
        .iter()
        .any(|n| *n == DiagnosticNotice::Cancelled { points_processed: 300 }));

    let total: i64 = out.records.map(|f| int(&f, "count")).sum();
    assert_eq!(total, 300);
}

#[test]
fn every_kind_conserves_counts() {
    let points: Vec<PointFeature> = (0..400)
        .map(|i| PointFeature::new((i % 20) as f64 * 5.0 + 0.3, (i / 20) as f64 * 5.0 + 0.7))
        .collect();
    for kind in TilingKind::ALL {
        let params = BinningParams {
            kind,
            size: CellSizeRequest::size(7.0),
            ..ten_by_ten()
        };
        let out = bin_points(&params, None, PointSource::new(&points), &NullMonitor).unwrap();
        assert_eq!(out.stats.points_matched, 400, "{kind}");
        let total: i64 = out.records.map(|f| int(&f, "count")).sum();
        assert_eq!(total, 400, "{kind}");
    }
}

/// Vertices, edge midpoints and quarter points of every cell outline that
/// fall strictly inside `extent`
fn outline_points(cells: &[Cell], extent: &Extent) -> Vec<PointFeature> {
    let inside = |x: f64, y: f64| {
        x > extent.min_x() && x < extent.max_x() && y > extent.min_y() && y < extent.max_y()
    };
    let mut points = Vec::new();
    for cell in cells {
        let polygon = cell.shape().to_polygon();
        for edge in polygon.exterior().0.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            for t in [0.0, 0.25, 0.5, 0.75] {
                let (x, y) = (a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                if inside(x, y) {
                    points.push(PointFeature::new(x, y));
                }
            }
        }
    }
    points
}

#[test]
fn points_on_shared_edges_are_conserved() {
    for kind in TilingKind::ALL {
        let params = BinningParams {
            kind,
            size: CellSizeRequest::size(6.3),
            extent: Some(Extent::new(-12.5, 3.0, 71.0, 48.25).unwrap()),
            ..Default::default()
        };
        let lattice = generate_lattice(&params, None).unwrap();
        let points = outline_points(&lattice.cells, &lattice.extent);
        assert!(points.len() > 100, "{kind}");

        let out = bin_points(&params, None, PointSource::new(&points), &NullMonitor).unwrap();
        assert_eq!(out.stats.points_unmatched, 0, "{kind}");
        assert_eq!(out.stats.points_matched, points.len() as u64, "{kind}");
        let total: i64 = out.records.map(|f| int(&f, "count")).sum();
        assert_eq!(total as usize, points.len(), "{kind}");
    }
}

#[test]
fn far_edge_sliver_is_binned() {
    let params = BinningParams {
        size: CellSizeRequest::size(1.0),
        extent: Some(Extent::new(0.0, 0.0, 1000.0000005, 1.0).unwrap()),
        ..Default::default()
    };
    let points = vec![PointFeature::new(1000.0000004, 0.5), PointFeature::new(0.5, 0.5)];
    let out = bin_points(&params, None, PointSource::new(points), &NullMonitor).unwrap();
    assert_eq!(out.records.len(), 1001);
    assert_eq!(out.stats.points_unmatched, 0);
    let last = out.records.last().unwrap();
    assert_eq!(int(&last, "col"), 1000);
    assert_eq!(int(&last, "count"), 1);
}

#[test]
fn extent_scanned_from_plain_stream() {
    let points = (0..50).map(|i| PointFeature::new(i as f64, (i * 2) as f64));
    let params = BinningParams {
        kind: TilingKind::HexagonFlat,
        size: CellSizeRequest::size(4.0),
        ..Default::default()
    };
    let out = bin_points(&params, None, PointSource::new(points), &NullMonitor).unwrap();
    assert_eq!(out.extent.max_x(), 49.0);
    assert_eq!(out.extent.max_y(), 98.0);
    assert_eq!(out.stats.points_matched, 50);
}
