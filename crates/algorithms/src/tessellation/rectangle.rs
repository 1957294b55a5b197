//! Rectangular (fishnet) lattice

use geo::{Coord, Rect};
use tessera_core::Extent;

use super::{steps_to_cover, CellShape, Sizing};

/// Grid of axis-aligned cells, (0,0) at the extent's lower-left corner.
///
/// In dimension mode the far row and column may overhang the extent; in
/// count mode the cell size is derived and the last edge snaps to the
/// extent's max so nothing overhangs.
#[derive(Debug, Clone)]
pub struct RectangleLayout {
    min_x: f64,
    min_y: f64,
    cell_width: f64,
    cell_height: f64,
    rows: usize,
    cols: usize,
    /// Far edges to snap to (count mode only)
    snap: Option<(f64, f64)>,
}

impl RectangleLayout {
    /// `None` when explicit dimensions need more rows or columns than can
    /// be addressed.
    pub fn new(extent: &Extent, sizing: Sizing) -> Option<Self> {
        let layout = match sizing {
            Sizing::Dimensions { width, height } => Self {
                min_x: extent.min_x(),
                min_y: extent.min_y(),
                cell_width: width,
                cell_height: height,
                rows: steps_to_cover(extent.min_y(), extent.max_y(), height)?,
                cols: steps_to_cover(extent.min_x(), extent.max_x(), width)?,
                snap: None,
            },
            Sizing::Counts { columns, rows } => Self {
                min_x: extent.min_x(),
                min_y: extent.min_y(),
                cell_width: extent.width() / columns as f64,
                cell_height: extent.height() / rows as f64,
                rows,
                cols: columns,
                snap: Some((extent.max_x(), extent.max_y())),
            },
        };
        Some(layout)
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    pub fn shape(&self, row: usize, col: usize) -> CellShape {
        let x0 = self.min_x + col as f64 * self.cell_width;
        let y0 = self.min_y + row as f64 * self.cell_height;
        let mut x1 = self.min_x + (col + 1) as f64 * self.cell_width;
        let mut y1 = self.min_y + (row + 1) as f64 * self.cell_height;

        if let Some((max_x, max_y)) = self.snap {
            if col + 1 == self.cols {
                x1 = max_x;
            }
            if row + 1 == self.rows {
                y1 = max_y;
            }
        }

        CellShape::Rect(Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }))
    }
}
