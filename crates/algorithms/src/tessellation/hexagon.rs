//! Hexagonal lattice
//!
//! Pointy-top hexagons stagger odd rows by half a cell width; flat-top
//! hexagons stagger odd columns by half a cell height. Side length equals
//! the circumradius. Cell (0,0) is centred on the extent's lower-left corner
//! and enough rows and columns are emitted to cover the whole extent.
//!
//! Centres and vertices sit on a grid of half-steps: a vertex is always
//! `origin + k * unit` for integer `k`, so neighbouring hexagons share
//! bit-identical edge coordinates and a point on a shared edge cannot fall
//! between them.

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use tessera_core::Extent;

use super::{steps_to_cover, CellShape};

/// Vertex offsets in grid units, counter-clockwise from 30 degrees
const POINTY_VERTICES: [(f64, f64); 6] = [
    (1.0, 1.0),
    (0.0, 2.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
    (0.0, -2.0),
    (1.0, -1.0),
];
/// Vertex offsets in grid units, counter-clockwise from 0 degrees
const FLAT_VERTICES: [(f64, f64); 6] = [
    (2.0, 0.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (-2.0, 0.0),
    (-1.0, -1.0),
    (1.0, -1.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexOrientation {
    Flat,
    Pointy,
}

#[derive(Debug, Clone)]
pub struct HexLayout {
    origin: Coord<f64>,
    side: f64,
    orientation: HexOrientation,
    /// Grid unit along x and y
    unit: (f64, f64),
    rows: usize,
    cols: usize,
}

impl HexLayout {
    /// `None` when the lattice needed to cover `extent` has more rows or
    /// columns than can be addressed.
    pub fn new(extent: &Extent, side: f64, orientation: HexOrientation) -> Option<Self> {
        let (dx, dy) = Self::spacing(side, orientation);
        let rows = steps_to_cover(extent.min_y(), extent.max_y(), dy)?.checked_add(1)?;
        let cols = steps_to_cover(extent.min_x(), extent.max_x(), dx)?.checked_add(1)?;
        let half = side / 2.0;
        let unit = match orientation {
            HexOrientation::Pointy => (dx / 2.0, half),
            HexOrientation::Flat => (half, dy / 2.0),
        };
        Some(Self {
            origin: Coord { x: extent.min_x(), y: extent.min_y() },
            side,
            orientation,
            unit,
            rows,
            cols,
        })
    }

    /// Centre-to-centre spacing between columns and rows
    fn spacing(side: f64, orientation: HexOrientation) -> (f64, f64) {
        let r3 = 3f64.sqrt();
        match orientation {
            // width sqrt(3)*s, height 2s, rows 0.75 * height apart
            HexOrientation::Pointy => (r3 * side, 1.5 * side),
            // width 2s, height sqrt(3)*s, columns 0.75 * width apart
            HexOrientation::Flat => (1.5 * side, r3 * side),
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn orientation(&self) -> HexOrientation {
        self.orientation
    }

    /// Centre of a cell in grid units
    fn grid_center(&self, row: usize, col: usize) -> (f64, f64) {
        match self.orientation {
            HexOrientation::Pointy => ((2 * col + row % 2) as f64, (3 * row) as f64),
            HexOrientation::Flat => ((3 * col) as f64, (2 * row + col % 2) as f64),
        }
    }

    fn to_coord(&self, kx: f64, ky: f64) -> Coord<f64> {
        Coord {
            x: self.origin.x + kx * self.unit.0,
            y: self.origin.y + ky * self.unit.1,
        }
    }

    pub fn center(&self, row: usize, col: usize) -> Coord<f64> {
        let (kx, ky) = self.grid_center(row, col);
        self.to_coord(kx, ky)
    }

    pub fn shape(&self, row: usize, col: usize) -> CellShape {
        let (kx, ky) = self.grid_center(row, col);
        let offsets = match self.orientation {
            HexOrientation::Pointy => &POINTY_VERTICES,
            HexOrientation::Flat => &FLAT_VERTICES,
        };
        let mut ring: Vec<Coord<f64>> = offsets
            .iter()
            .map(|&(ox, oy)| self.to_coord(kx + ox, ky + oy))
            .collect();
        ring.push(ring[0]);
        CellShape::Polygon(Polygon::new(LineString::new(ring), vec![]))
    }
}
