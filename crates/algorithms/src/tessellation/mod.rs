//! Regular lattices over an extent
//!
//! Generates the cells that points are later binned into:
//! - Rectangle: row-major grid anchored at the lower-left corner
//! - Hexagon (flat-top and pointy-top): offset rows/columns
//! - Triangle: rectangular blocks split along alternating diagonals
//! - Circle-pack: overlapping circles on staggered rows
//!
//! Every tiling goes through the same [`Layout`] interface and is emitted in
//! row-major order, optionally restricted to a [`BoundarySource`].

mod boundary;
mod circle;
mod hexagon;
mod rectangle;
mod resolve;
mod triangle;

pub use boundary::BoundaryFilter;
pub use circle::CircleLayout;
pub use hexagon::{HexLayout, HexOrientation};
pub use rectangle::RectangleLayout;
pub use resolve::{
    resolve, resolve_cell_spec, resolve_extent, CellSizeRequest, Resolved, DEFAULT_CELLS_ACROSS,
};
pub use triangle::TriangleLayout;

use geo::{BoundingRect, Centroid, Coord, Intersects, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tessera_core::{BoundarySource, Error, Extent, Result};
use tracing::debug;

use crate::maybe_rayon::*;

/// Tiling kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TilingKind {
    #[default]
    Rectangle,
    HexagonFlat,
    HexagonPointy,
    Triangle,
    CirclePack,
}

impl TilingKind {
    pub const ALL: [TilingKind; 5] = [
        TilingKind::Rectangle,
        TilingKind::HexagonFlat,
        TilingKind::HexagonPointy,
        TilingKind::Triangle,
        TilingKind::CirclePack,
    ];

    /// Centre-to-centre spacing along x and y, in units of the cell size
    /// (side length or radius). Used to turn column/row counts into a size.
    pub fn spacing_factors(&self) -> (f64, f64) {
        let r3 = 3f64.sqrt();
        match self {
            TilingKind::Rectangle => (1.0, 1.0),
            TilingKind::HexagonPointy => (r3, 1.5),
            TilingKind::CirclePack => (r3, 2f64.sqrt()),
            TilingKind::HexagonFlat => (1.5, r3),
            // two triangles per block of width s
            TilingKind::Triangle => (0.5, r3 / 2.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TilingKind::Rectangle => "rectangle",
            TilingKind::HexagonFlat => "hexagon-flat",
            TilingKind::HexagonPointy => "hexagon-pointy",
            TilingKind::Triangle => "triangle",
            TilingKind::CirclePack => "circle",
        }
    }
}

impl fmt::Display for TilingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TilingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rectangle" | "rect" | "square" | "fishnet" => Ok(TilingKind::Rectangle),
            "hexagon-flat" | "hex-flat" | "flat" => Ok(TilingKind::HexagonFlat),
            "hexagon-pointy" | "hex-pointy" | "hexagon" | "hex" | "pointy" => {
                Ok(TilingKind::HexagonPointy)
            }
            "triangle" | "tri" => Ok(TilingKind::Triangle),
            "circle" | "circle-pack" | "circles" => Ok(TilingKind::CirclePack),
            _ => Err(Error::InvalidParameter {
                name: "kind",
                value: s.to_string(),
                reason: "use rectangle, hexagon-flat, hexagon-pointy, triangle or circle".into(),
            }),
        }
    }
}

/// How cell dimensions are given. Exactly one mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sizing {
    /// Explicit cell dimensions; the far row/column may overhang the extent.
    /// For non-rectangular tilings `width` is the side length or radius.
    Dimensions { width: f64, height: f64 },
    /// Requested grid shape; the cell size is derived from it.
    ///
    /// Rectangles come out exactly `rows x columns` with nothing
    /// overhanging. Hexagon, triangle and circle-pack lattices use the
    /// counts only to pick the side length (or radius) and then add the
    /// staggered rows and columns needed to cover the extent, so they
    /// usually emit more cells than requested.
    Counts { columns: usize, rows: usize },
}

/// Tiling kind plus sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub kind: TilingKind,
    pub sizing: Sizing,
}

impl CellSpec {
    /// Validated constructor
    pub fn new(kind: TilingKind, sizing: Sizing) -> Result<Self> {
        match sizing {
            Sizing::Dimensions { width, height } => {
                if !(width.is_finite() && width > 0.0) {
                    return Err(Error::invalid_size("width", width, "must be finite and > 0"));
                }
                if !(height.is_finite() && height > 0.0) {
                    return Err(Error::invalid_size("height", height, "must be finite and > 0"));
                }
            }
            Sizing::Counts { columns, rows } => {
                if columns == 0 {
                    return Err(Error::invalid_size("columns", columns, "must be > 0"));
                }
                if rows == 0 {
                    return Err(Error::invalid_size("rows", rows, "must be > 0"));
                }
            }
        }
        Ok(Self { kind, sizing })
    }

    /// Square cells (or side length / radius) of `size`
    pub fn with_size(kind: TilingKind, size: f64) -> Result<Self> {
        Self::new(kind, Sizing::Dimensions { width: size, height: size })
    }

    pub fn with_counts(kind: TilingKind, columns: usize, rows: usize) -> Result<Self> {
        Self::new(kind, Sizing::Counts { columns, rows })
    }
}

/// Stable cell identifier. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

impl CellId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}c{}", self.row, self.col)
    }
}

/// Cell geometry
#[derive(Debug, Clone, PartialEq)]
pub enum CellShape {
    Rect(Rect<f64>),
    Polygon(Polygon<f64>),
    /// Exact circle plus the polygon used for output and boundary tests
    Circle {
        center: Coord<f64>,
        radius: f64,
        outline: Polygon<f64>,
    },
}

impl CellShape {
    pub fn bounding_rect(&self) -> Rect<f64> {
        match self {
            CellShape::Rect(r) => *r,
            CellShape::Polygon(p) => p
                .bounding_rect()
                .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 })),
            CellShape::Circle { center, radius, .. } => Rect::new(
                Coord { x: center.x - radius, y: center.y - radius },
                Coord { x: center.x + radius, y: center.y + radius },
            ),
        }
    }

    /// Exact, boundary-inclusive containment test
    pub fn contains_coord(&self, c: Coord<f64>) -> bool {
        match self {
            CellShape::Rect(r) => {
                c.x >= r.min().x && c.x <= r.max().x && c.y >= r.min().y && c.y <= r.max().y
            }
            CellShape::Polygon(p) => p.intersects(&c),
            CellShape::Circle { center, radius, .. } => {
                let dx = c.x - center.x;
                let dy = c.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
        }
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        match self {
            CellShape::Rect(r) => r.to_polygon(),
            CellShape::Polygon(p) => p.clone(),
            CellShape::Circle { outline, .. } => outline.clone(),
        }
    }

    pub fn centroid(&self) -> Coord<f64> {
        match self {
            CellShape::Rect(r) => r.center(),
            CellShape::Polygon(p) => p
                .centroid()
                .map(|c| c.0)
                .unwrap_or_else(|| self.bounding_rect().center()),
            CellShape::Circle { center, .. } => *center,
        }
    }
}

/// Aggregate results attached to a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub count: u64,
    pub weight_sum: f64,
    pub weight_min: f64,
    pub weight_max: f64,
    /// Per-label counts when a case field is configured
    pub cases: BTreeMap<String, u64>,
}

impl Default for Aggregates {
    fn default() -> Self {
        Self {
            count: 0,
            weight_sum: 0.0,
            weight_min: f64::INFINITY,
            weight_max: f64::NEG_INFINITY,
            cases: BTreeMap::new(),
        }
    }
}

impl Aggregates {
    pub(crate) fn add(&mut self, weight: f64, label: Option<String>) {
        self.count += 1;
        self.weight_sum += weight;
        self.weight_min = self.weight_min.min(weight);
        self.weight_max = self.weight_max.max(weight);
        if let Some(label) = label {
            *self.cases.entry(label).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn weight_mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.weight_sum / self.count as f64)
    }

    pub fn weight_range(&self) -> Option<(f64, f64)> {
        (self.count > 0).then_some((self.weight_min, self.weight_max))
    }
}

/// A generated lattice cell. Geometry is fixed at creation; aggregates are
/// only changed by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    shape: CellShape,
    aggregates: Aggregates,
}

impl Cell {
    pub fn new(id: CellId, shape: CellShape) -> Self {
        Self { id, shape, aggregates: Aggregates::default() }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn row(&self) -> usize {
        self.id.row
    }

    pub fn col(&self) -> usize {
        self.id.col
    }

    pub fn shape(&self) -> &CellShape {
        &self.shape
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }

    pub fn count(&self) -> u64 {
        self.aggregates.count
    }

    pub fn weight_sum(&self) -> f64 {
        self.aggregates.weight_sum
    }

    pub(crate) fn aggregates_mut(&mut self) -> &mut Aggregates {
        &mut self.aggregates
    }
}

/// Lattice generation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeParams {
    /// With a boundary: keep only cells fully inside it (otherwise keep
    /// cells that merely intersect it)
    pub boundary_inside: bool,
    /// Sides of the polygon approximating each circle-pack cell
    pub circle_segments: usize,
    /// Refuse to build lattices larger than this
    pub max_cells: usize,
}

impl Default for LatticeParams {
    fn default() -> Self {
        Self {
            boundary_inside: false,
            circle_segments: 32,
            max_cells: 50_000_000,
        }
    }
}

/// Geometry of one tiling over one extent
#[derive(Debug, Clone)]
pub enum Layout {
    Rectangle(RectangleLayout),
    Hexagon(HexLayout),
    Triangle(TriangleLayout),
    Circle(CircleLayout),
}

impl Layout {
    pub fn new(extent: &Extent, spec: &CellSpec, params: &LatticeParams) -> Result<Self> {
        let side = side_length(extent, spec);
        let layout = match spec.kind {
            TilingKind::Rectangle => {
                RectangleLayout::new(extent, spec.sizing).map(Layout::Rectangle)
            }
            TilingKind::HexagonFlat => {
                HexLayout::new(extent, side, HexOrientation::Flat).map(Layout::Hexagon)
            }
            TilingKind::HexagonPointy => {
                HexLayout::new(extent, side, HexOrientation::Pointy).map(Layout::Hexagon)
            }
            TilingKind::Triangle => TriangleLayout::new(extent, side).map(Layout::Triangle),
            TilingKind::CirclePack => {
                CircleLayout::new(extent, side, params.circle_segments).map(Layout::Circle)
            }
        };

        let layout = layout.ok_or_else(|| Error::InvalidParameter {
            name: "max_cells",
            value: params.max_cells.to_string(),
            reason: format!("cells of size {} are too small to cover the extent", side),
        })?;

        let (rows, cols) = layout.dims();
        let total = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if total > params.max_cells {
            return Err(Error::InvalidParameter {
                name: "max_cells",
                value: params.max_cells.to_string(),
                reason: format!("lattice of {} x {} cells exceeds the limit", rows, cols),
            });
        }
        Ok(layout)
    }

    /// (rows, columns)
    pub fn dims(&self) -> (usize, usize) {
        match self {
            Layout::Rectangle(l) => l.dims(),
            Layout::Hexagon(l) => l.dims(),
            Layout::Triangle(l) => l.dims(),
            Layout::Circle(l) => l.dims(),
        }
    }

    pub fn len(&self) -> usize {
        let (rows, cols) = self.dims();
        rows * cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self, row: usize, col: usize) -> CellShape {
        match self {
            Layout::Rectangle(l) => l.shape(row, col),
            Layout::Hexagon(l) => l.shape(row, col),
            Layout::Triangle(l) => l.shape(row, col),
            Layout::Circle(l) => l.shape(row, col),
        }
    }

    /// Lazy row-major cell sequence
    pub fn cells(self) -> LatticeIter {
        let (rows, cols) = self.dims();
        LatticeIter { layout: self, rows, cols, next: 0 }
    }
}

/// Side length (or radius) for non-rectangular tilings.
///
/// Count mode picks the largest size for which `columns` cells span the
/// extent width and `rows` cells span its height.
fn side_length(extent: &Extent, spec: &CellSpec) -> f64 {
    match spec.sizing {
        Sizing::Dimensions { width, .. } => width,
        Sizing::Counts { columns, rows } => {
            let (fx, fy) = spec.kind.spacing_factors();
            let from_cols = extent.width() / (columns as f64 * fx);
            let from_rows = extent.height() / (rows as f64 * fy);
            from_cols.min(from_rows)
        }
    }
}

/// Largest row or column count a layout will attempt to address
const MAX_STEPS: f64 = 4_503_599_627_370_496.0; // 2^52

/// Fewest steps of `step` from `start` whose far edge reaches `end`, at
/// least one.
///
/// Float noise just past a whole number of steps is ignored unless the far
/// edge, computed as `start + steps * step` the way layouts compute it,
/// really falls short of `end`. `None` when the count is not finite or too
/// large to address.
pub(crate) fn steps_to_cover(start: f64, end: f64, step: f64) -> Option<usize> {
    let n = (end - start) / step;
    if !n.is_finite() || n >= MAX_STEPS {
        return None;
    }
    let rounded = n.round();
    let mut steps = if (n - rounded).abs() < 1e-9 * rounded.max(1.0) { rounded } else { n.ceil() };
    steps = steps.max(1.0);
    if start + steps * step < end {
        steps += 1.0;
    }
    Some(steps as usize)
}

/// Closed regular polygon around `center`, first vertex at `start_angle`
/// radians. Used for circle outlines.
pub(crate) fn regular_polygon(
    center: Coord<f64>,
    radius: f64,
    sides: usize,
    start_angle: f64,
) -> Polygon<f64> {
    let mut coords = Vec::with_capacity(sides + 1);
    for i in 0..sides {
        let angle = start_angle + 2.0 * PI * i as f64 / sides as f64;
        coords.push(Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}

/// Row-major iterator over a layout's cells
#[derive(Debug, Clone)]
pub struct LatticeIter {
    layout: Layout,
    rows: usize,
    cols: usize,
    next: usize,
}

impl Iterator for LatticeIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.cols == 0 || self.next >= self.rows * self.cols {
            return None;
        }
        let row = self.next / self.cols;
        let col = self.next % self.cols;
        self.next += 1;
        Some(Cell::new(CellId::new(row, col), self.layout.shape(row, col)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.rows * self.cols).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for LatticeIter {}

/// Generate the lattice for `spec` over `extent`.
///
/// When a boundary is given, a cell is kept only if it lies inside the
/// boundary union (`params.boundary_inside`) or intersects it. Output is
/// always row-major.
///
/// # Arguments
/// * `extent` - Area to cover
/// * `spec` - Tiling kind and sizing
/// * `boundary` - Optional polygon set restricting the cells
/// * `params` - Boundary mode and geometry options
pub fn generate(
    extent: &Extent,
    spec: &CellSpec,
    boundary: Option<&BoundarySource>,
    params: &LatticeParams,
) -> Result<Vec<Cell>> {
    let layout = Layout::new(extent, spec, params)?;
    let (rows, cols) = layout.dims();
    debug!("lattice {}: {} rows x {} cols", spec.kind, rows, cols);

    let cells: Vec<Cell> = layout.cells().collect();

    match boundary {
        Some(b) => {
            let filter = BoundaryFilter::new(b, params.boundary_inside);
            let before = cells.len();
            let kept: Vec<Cell> = cells
                .into_par_iter()
                .filter(|cell| filter.retains(cell.shape()))
                .collect();
            debug!("boundary filter kept {} of {} cells", kept.len(), before);
            Ok(kept)
        }
        None => Ok(cells),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(w: f64, h: f64) -> Extent {
        Extent::new(0.0, 0.0, w, h).unwrap()
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("hex".parse::<TilingKind>().unwrap(), TilingKind::HexagonPointy);
        assert_eq!("Hexagon-Flat".parse::<TilingKind>().unwrap(), TilingKind::HexagonFlat);
        assert_eq!("fishnet".parse::<TilingKind>().unwrap(), TilingKind::Rectangle);
        assert!("pentagon".parse::<TilingKind>().is_err());
        for kind in TilingKind::ALL {
            assert_eq!(kind.name().parse::<TilingKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_spec_validation() {
        assert!(CellSpec::with_size(TilingKind::Rectangle, 0.0).is_err());
        assert!(CellSpec::with_size(TilingKind::Rectangle, f64::NAN).is_err());
        assert!(CellSpec::with_counts(TilingKind::Rectangle, 0, 4).is_err());
        assert!(matches!(
            CellSpec::new(TilingKind::Triangle, Sizing::Dimensions { width: 1.0, height: -1.0 }),
            Err(Error::InvalidSize { name: "height", .. })
        ));
        assert!(CellSpec::with_counts(TilingKind::HexagonFlat, 3, 4).is_ok());
    }

    #[test]
    fn test_cell_id_ordering_is_row_major() {
        let mut ids = vec![CellId::new(1, 0), CellId::new(0, 5), CellId::new(0, 1)];
        ids.sort();
        assert_eq!(ids, vec![CellId::new(0, 1), CellId::new(0, 5), CellId::new(1, 0)]);
        assert_eq!(CellId::new(3, 7).to_string(), "r3c7");
    }

    #[test]
    fn test_steps_to_cover() {
        assert_eq!(steps_to_cover(0.0, 100.0, 10.0), Some(10));
        assert_eq!(steps_to_cover(0.0, 101.0, 10.0), Some(11));
        assert_eq!(steps_to_cover(0.0, 0.3, 0.1), Some(3));
        assert_eq!(steps_to_cover(0.0, 1.0, 10.0), Some(1));
        assert_eq!(steps_to_cover(-5.0, 5.0, 2.5), Some(4));
    }

    #[test]
    fn test_steps_to_cover_keeps_real_sliver() {
        // within the noise tolerance, but the edge at 1000 misses the extent
        assert_eq!(steps_to_cover(0.0, 1000.0000005, 1.0), Some(1001));
        assert_eq!(steps_to_cover(0.0, 1000.0, 1.0), Some(1000));
    }

    #[test]
    fn test_steps_to_cover_overflow() {
        assert_eq!(steps_to_cover(0.0, 10.0, 1e-300), None);
        assert_eq!(steps_to_cover(0.0, f64::MAX, f64::MIN_POSITIVE), None);
    }

    #[test]
    fn test_tiny_cells_rejected_for_every_kind() {
        let e = extent(10.0, 10.0);
        for kind in TilingKind::ALL {
            let spec = CellSpec::with_size(kind, 1e-300).unwrap();
            let err = Layout::new(&e, &spec, &LatticeParams::default()).unwrap_err();
            assert!(
                matches!(err, Error::InvalidParameter { name: "max_cells", .. }),
                "{}: {:?}",
                kind,
                err
            );
        }
    }

    #[test]
    fn test_counts_exact_only_for_rectangles() {
        let e = extent(30.0, 20.0);
        let rect = CellSpec::with_counts(TilingKind::Rectangle, 6, 4).unwrap();
        let layout = Layout::new(&e, &rect, &LatticeParams::default()).unwrap();
        assert_eq!(layout.dims(), (4, 6));

        for kind in [TilingKind::HexagonPointy, TilingKind::Triangle, TilingKind::CirclePack] {
            let spec = CellSpec::with_counts(kind, 6, 4).unwrap();
            let (rows, cols) = Layout::new(&e, &spec, &LatticeParams::default()).unwrap().dims();
            assert!(rows >= 4 && cols >= 6, "{}: {} x {}", kind, rows, cols);
        }
    }

    #[test]
    fn test_regular_polygon_closed() {
        let p = regular_polygon(Coord { x: 0.0, y: 0.0 }, 2.0, 6, 0.0);
        let coords = &p.exterior().0;
        assert_eq!(coords.len(), 7);
        assert_eq!(coords.first(), coords.last());
        assert!((coords[0].x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_generate_every_kind_row_major() {
        let e = extent(10.0, 10.0);
        for kind in TilingKind::ALL {
            let spec = CellSpec::with_size(kind, 2.0).unwrap();
            let cells = generate(&e, &spec, None, &LatticeParams::default()).unwrap();
            assert!(!cells.is_empty(), "{} produced no cells", kind);
            for pair in cells.windows(2) {
                assert!(pair[0].id() < pair[1].id(), "{} out of order", kind);
            }
        }
    }

    #[test]
    fn test_iterator_is_lazy_and_exact() {
        let e = extent(10.0, 10.0);
        let spec = CellSpec::with_counts(TilingKind::Rectangle, 5, 4).unwrap();
        let layout = Layout::new(&e, &spec, &LatticeParams::default()).unwrap();
        let mut it = layout.cells();
        assert_eq!(it.len(), 20);
        let first = it.next().unwrap();
        assert_eq!(first.id(), CellId::new(0, 0));
        assert_eq!(it.len(), 19);
        assert_eq!(it.last().unwrap().id(), CellId::new(3, 4));
    }

    #[test]
    fn test_max_cells_guard() {
        let e = extent(1000.0, 1000.0);
        let spec = CellSpec::with_size(TilingKind::Rectangle, 1.0).unwrap();
        let params = LatticeParams { max_cells: 1000, ..Default::default() };
        assert!(matches!(
            Layout::new(&e, &spec, &params),
            Err(Error::InvalidParameter { name: "max_cells", .. })
        ));
    }

    #[test]
    fn test_circle_shape_contains_exact() {
        let shape = CellShape::Circle {
            center: Coord { x: 0.0, y: 0.0 },
            radius: 1.0,
            outline: regular_polygon(Coord { x: 0.0, y: 0.0 }, 1.0, 8, 0.0),
        };
        assert!(shape.contains_coord(Coord { x: 1.0, y: 0.0 }));
        assert!(shape.contains_coord(Coord { x: 0.7, y: 0.7 }));
        assert!(!shape.contains_coord(Coord { x: 0.75, y: 0.75 }));
    }

    #[test]
    fn test_aggregates() {
        let mut a = Aggregates::default();
        assert!(a.is_empty());
        assert_eq!(a.weight_mean(), None);
        a.add(2.0, Some("a".into()));
        a.add(4.0, Some("b".into()));
        a.add(6.0, Some("a".into()));
        assert_eq!(a.count, 3);
        assert_eq!(a.weight_sum, 12.0);
        assert_eq!(a.weight_mean(), Some(4.0));
        assert_eq!(a.weight_range(), Some((2.0, 6.0)));
        assert_eq!(a.cases.get("a"), Some(&2));
    }
}
