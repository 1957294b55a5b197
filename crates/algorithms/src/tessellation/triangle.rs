//! Triangular lattice
//!
//! The extent is covered by blocks of `s` by `s * sqrt(3) / 2` (the band
//! height of a hexagon grid of side `s`). Each block is split along one
//! diagonal into two triangles; the diagonal direction alternates with
//! `(row + block) % 2`, so neighbouring triangles share edges and the
//! tiling has no gaps. Column `2 * block` is the lower triangle of a block,
//! `2 * block + 1` the upper one.

use geo::{Coord, LineString, Polygon};
use tessera_core::Extent;

use super::{steps_to_cover, CellShape};

#[derive(Debug, Clone)]
pub struct TriangleLayout {
    origin: Coord<f64>,
    block_width: f64,
    block_height: f64,
    rows: usize,
    blocks: usize,
}

impl TriangleLayout {
    /// `None` when the lattice needed to cover `extent` has more rows or
    /// columns than can be addressed.
    pub fn new(extent: &Extent, side: f64) -> Option<Self> {
        let block_height = side * 3f64.sqrt() / 2.0;
        let rows = steps_to_cover(extent.min_y(), extent.max_y(), block_height)?;
        let blocks = steps_to_cover(extent.min_x(), extent.max_x(), side)?;
        // two triangles per block
        blocks.checked_mul(2)?;
        Some(Self {
            origin: Coord { x: extent.min_x(), y: extent.min_y() },
            block_width: side,
            block_height,
            rows,
            blocks,
        })
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.blocks * 2)
    }

    pub fn shape(&self, row: usize, col: usize) -> CellShape {
        let block = col / 2;
        let upper = col % 2 == 1;

        let x0 = self.origin.x + block as f64 * self.block_width;
        let x1 = self.origin.x + (block + 1) as f64 * self.block_width;
        let y0 = self.origin.y + row as f64 * self.block_height;
        let y1 = self.origin.y + (row + 1) as f64 * self.block_height;

        let ll = Coord { x: x0, y: y0 };
        let lr = Coord { x: x1, y: y0 };
        let ur = Coord { x: x1, y: y1 };
        let ul = Coord { x: x0, y: y1 };

        // Rising diagonal (ll-ur) on even blocks, falling (ul-lr) on odd
        let corners = match ((row + block) % 2 == 0, upper) {
            (true, false) => [ll, lr, ur],
            (true, true) => [ll, ur, ul],
            (false, false) => [ll, lr, ul],
            (false, true) => [lr, ur, ul],
        };

        CellShape::Polygon(Polygon::new(
            LineString::new(vec![corners[0], corners[1], corners[2], corners[0]]),
            vec![],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_two_triangles_per_block() {
        let e = Extent::new(0.0, 0.0, 4.0, 3.0).unwrap();
        let l = TriangleLayout::new(&e, 2.0).unwrap();
        let (rows, cols) = l.dims();
        assert_eq!(cols, 4);
        assert_eq!(Some(rows), steps_to_cover(0.0, 3.0, 3f64.sqrt()));
    }

    #[test]
    fn test_halves_fill_block() {
        let e = Extent::new(0.0, 0.0, 4.0, 4.0).unwrap();
        let l = TriangleLayout::new(&e, 2.0).unwrap();
        let block_area = 2.0 * 3f64.sqrt();
        for row in 0..2 {
            for block in 0..2 {
                let area: f64 = [2 * block, 2 * block + 1]
                    .iter()
                    .map(|&c| l.shape(row, c).to_polygon().unsigned_area())
                    .sum();
                assert!((area - block_area).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_diagonals_alternate() {
        let e = Extent::new(0.0, 0.0, 4.0, 4.0).unwrap();
        let l = TriangleLayout::new(&e, 2.0).unwrap();
        // Just above the rising diagonal of block (0,0): upper triangle
        let p = Coord { x: 1.0, y: 0.9 };
        assert!(l.shape(0, 1).contains_coord(p));
        assert!(!l.shape(0, 0).contains_coord(p));
        // Block (0,1) has a falling diagonal: lower-left corner is lower half
        let q = Coord { x: 2.1, y: 0.1 };
        assert!(l.shape(0, 2).contains_coord(q));
        assert!(!l.shape(0, 3).contains_coord(q));
    }

    #[test]
    fn test_every_point_covered_once_in_interior() {
        let e = Extent::new(0.0, 0.0, 5.0, 5.0).unwrap();
        let l = TriangleLayout::new(&e, 1.0).unwrap();
        let (rows, cols) = l.dims();
        let p = Coord { x: 2.37, y: 3.11 };
        let hits = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .filter(|&(r, c)| l.shape(r, c).contains_coord(p))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_tiny_side_refused() {
        let e = Extent::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(TriangleLayout::new(&e, 1e-300).is_none());
        assert!(TriangleLayout::new(&e, 1e-150).is_none());
    }
}
