//! Property tests for lattice generation and aggregation.

use proptest::prelude::*;
use tessera_algorithms::binning::{aggregate, AggregateParams, UnitWeight};
use tessera_algorithms::tessellation::{generate, CellId, CellSpec, LatticeParams, Sizing, TilingKind};
use tessera_core::{Extent, NullMonitor, PointFeature};

fn kind_strategy() -> impl Strategy<Value = TilingKind> {
    prop::sample::select(TilingKind::ALL.to_vec())
}

/// Points strictly inside a `w` x `h` extent at the origin
fn points_strategy(w: f64, h: f64, max: usize) -> impl Strategy<Value = Vec<PointFeature>> {
    prop::collection::vec((0.001f64..0.999, 0.001f64..0.999), 0..max)
        .prop_map(move |v| v.into_iter().map(|(fx, fy)| PointFeature::new(fx * w, fy * h)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rectangle_cell_count_with_explicit_size(
        w in 1u32..200,
        h in 1u32..200,
        mw in 1u32..80,
        mh in 1u32..80,
    ) {
        // quarter-unit sizes are exact in binary, so the expected ceil is exact too
        let extent = Extent::new(0.0, 0.0, w as f64, h as f64).unwrap();
        let spec = CellSpec::new(
            TilingKind::Rectangle,
            Sizing::Dimensions { width: mw as f64 / 4.0, height: mh as f64 / 4.0 },
        ).unwrap();
        let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();

        let cols = (4 * w).div_ceil(mw) as usize;
        let rows = (4 * h).div_ceil(mh) as usize;
        prop_assert_eq!(cells.len(), cols * rows);
    }

    #[test]
    fn rectangle_cell_count_with_counts(
        w in 0.5f64..1e4,
        h in 0.5f64..1e4,
        columns in 1usize..60,
        rows in 1usize..60,
    ) {
        let extent = Extent::new(-w, -h, w, h).unwrap();
        let spec = CellSpec::with_counts(TilingKind::Rectangle, columns, rows).unwrap();
        let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();
        prop_assert_eq!(cells.len(), columns * rows);
    }

    #[test]
    fn emission_is_row_major(kind in kind_strategy(), size in 1.0f64..8.0) {
        let extent = Extent::new(0.0, 0.0, 40.0, 30.0).unwrap();
        let spec = CellSpec::with_size(kind, size).unwrap();
        let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();
        let ids: Vec<CellId> = cells.iter().map(|c| c.id()).collect();
        prop_assert!(ids.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn counts_are_conserved(
        kind in kind_strategy(),
        size in 1.0f64..10.0,
        points in points_strategy(50.0, 40.0, 300),
    ) {
        let extent = Extent::new(0.0, 0.0, 50.0, 40.0).unwrap();
        let spec = CellSpec::with_size(kind, size).unwrap();
        let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();
        let agg = aggregate(cells, &points, &UnitWeight, &AggregateParams::default(), &NullMonitor);

        let total: u64 = agg.cells.iter().map(|c| c.count()).sum();
        prop_assert_eq!(total, points.len() as u64);
        prop_assert_eq!(agg.stats.points_unmatched, 0);
    }

    #[test]
    fn unit_weight_sum_equals_count(
        kind in kind_strategy(),
        points in points_strategy(20.0, 20.0, 200),
    ) {
        let extent = Extent::new(0.0, 0.0, 20.0, 20.0).unwrap();
        let spec = CellSpec::with_size(kind, 3.0).unwrap();
        let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();
        let agg = aggregate(cells, &points, &UnitWeight, &AggregateParams::default(), &NullMonitor);
        for cell in &agg.cells {
            prop_assert_eq!(cell.weight_sum(), cell.count() as f64);
        }
    }

    #[test]
    fn pruning_is_deterministic(
        kind in kind_strategy(),
        points in points_strategy(30.0, 30.0, 100),
    ) {
        let extent = Extent::new(0.0, 0.0, 30.0, 30.0).unwrap();
        let spec = CellSpec::with_size(kind, 4.0).unwrap();
        let params = AggregateParams { only_valid_grid: true, ..Default::default() };

        let run = || {
            let cells = generate(&extent, &spec, None, &LatticeParams::default()).unwrap();
            let agg = aggregate(cells, &points, &UnitWeight, &params, &NullMonitor);
            agg.cells.iter().map(|c| (c.id(), c.count())).collect::<Vec<_>>()
        };
        let first = run();
        prop_assert!(first.iter().all(|(_, n)| *n > 0));
        prop_assert_eq!(first, run());
    }
}
