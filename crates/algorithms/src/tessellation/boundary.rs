//! Boundary filtering of lattice cells
//!
//! Boundary parts are indexed once; each cell only tests the parts whose
//! envelopes touch its own.

use geo::{BooleanOps, BoundingRect, Contains, Intersects, MultiPolygon, Polygon, Rect};
use tessera_core::BoundarySource;

use super::CellShape;
use crate::spatial_index::EnvelopeIndex;

/// Containment test of cells against a boundary union
#[derive(Debug)]
pub struct BoundaryFilter<'a> {
    parts: &'a [Polygon<f64>],
    index: EnvelopeIndex,
    inside: bool,
}

impl<'a> BoundaryFilter<'a> {
    /// Index the boundary parts.
    ///
    /// With `inside` set, a cell is kept only when the union of the parts
    /// fully contains it; otherwise touching the union is enough.
    pub fn new(boundary: &'a BoundarySource, inside: bool) -> Self {
        let parts = boundary.polygons.as_slice();
        let index = EnvelopeIndex::build(
            parts
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.bounding_rect().map(|r: Rect<f64>| (i, r))),
        );
        Self { parts, index, inside }
    }

    pub fn retains(&self, shape: &CellShape) -> bool {
        let candidates = self.index.candidates_in(&shape.bounding_rect());
        if candidates.is_empty() {
            return false;
        }

        let cell = shape.to_polygon();
        if !self.inside {
            return candidates.iter().any(|&i| self.parts[i].intersects(&cell));
        }

        if candidates.iter().any(|&i| self.parts[i].contains(&cell)) {
            return true;
        }
        if candidates.len() == 1 {
            return false;
        }

        // The cell may straddle several parts that only cover it together
        let union = candidates
            .iter()
            .skip(1)
            .fold(MultiPolygon::new(vec![self.parts[candidates[0]].clone()]), |acc, &i| {
                acc.union(&MultiPolygon::new(vec![self.parts[i].clone()]))
            });
        union.contains(&cell)
    }
}
