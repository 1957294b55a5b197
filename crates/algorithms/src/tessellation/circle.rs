//! Circle-pack lattice
//!
//! Circles of radius `r` with centres `r * sqrt(3)` apart along a row and
//! rows `r * sqrt(2)` apart. Odd rows are offset by `r` from even rows: even
//! rows start half a radius before the extent's left edge and odd rows half
//! a radius after it. With that offset the rows may be at most about
//! `1.49 * r` apart before gaps open between three neighbouring circles, so
//! `sqrt(2) * r` keeps every point of the extent inside some circle.
//!
//! The circles overlap their neighbours. A point in an overlap goes to the
//! first matching cell, and callers wanting disjoint output prune to the
//! valid grid.

use geo::Coord;
use tessera_core::Extent;

use super::{regular_polygon, steps_to_cover, CellShape};

/// Fewest sides accepted for the output outline
const MIN_SEGMENTS: usize = 8;

#[derive(Debug, Clone)]
pub struct CircleLayout {
    origin: Coord<f64>,
    radius: f64,
    segments: usize,
    rows: usize,
    cols: usize,
}

impl CircleLayout {
    /// `None` when the lattice needed to cover `extent` has more rows or
    /// columns than can be addressed.
    pub fn new(extent: &Extent, radius: f64, segments: usize) -> Option<Self> {
        let (dx, dy) = Self::spacing(radius);
        let first_x = extent.min_x() - radius / 2.0;
        Some(Self {
            origin: Coord { x: extent.min_x(), y: extent.min_y() },
            radius,
            segments: segments.max(MIN_SEGMENTS),
            rows: steps_to_cover(extent.min_y(), extent.max_y(), dy)?.checked_add(1)?,
            // even rows start furthest left, so they need the most columns
            cols: steps_to_cover(first_x, extent.max_x(), dx)?.checked_add(1)?,
        })
    }

    /// Centre-to-centre spacing along a row and between rows
    fn spacing(radius: f64) -> (f64, f64) {
        (radius * 3f64.sqrt(), radius * 2f64.sqrt())
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn center(&self, row: usize, col: usize) -> Coord<f64> {
        let (dx, dy) = Self::spacing(self.radius);
        let half = self.radius / 2.0;
        let start = if row % 2 == 1 { self.origin.x + half } else { self.origin.x - half };
        Coord {
            x: start + col as f64 * dx,
            y: self.origin.y + row as f64 * dy,
        }
    }

    pub fn shape(&self, row: usize, col: usize) -> CellShape {
        let center = self.center(row, col);
        CellShape::Circle {
            center,
            radius: self.radius,
            outline: regular_polygon(center, self.radius, self.segments, 0.0),
        }
    }
}
