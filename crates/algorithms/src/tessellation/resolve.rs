//! Extent and cell-size resolution
//!
//! Turns optional caller input into a concrete [`Extent`] and [`CellSpec`].
//! Bad sizing is a configuration error and is reported before any cell is
//! built; a missing cell size is replaced by a default and reported as a
//! notice.

use geo::Rect;
use serde::{Deserialize, Serialize};
use tessera_core::{BoundarySource, DiagnosticNotice, Diagnostics, Error, Extent, Result};
use tracing::warn;

use super::{CellSpec, Sizing, TilingKind};

/// Cells across the short side of the extent when no size is given
pub const DEFAULT_CELLS_ACROSS: f64 = 250.0;

/// Padding applied to a derived extent that has no width or height
const DEGENERATE_PAD: f64 = 0.5;

/// Raw sizing input, as supplied by the caller.
///
/// Precedence: `columns`/`rows` (both > 0), then `width`/`height`, then
/// `cell_size`, then the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSizeRequest {
    /// Square cell size, hexagon/triangle side length or circle radius
    pub cell_size: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// 0 means unset
    pub columns: usize,
    /// 0 means unset
    pub rows: usize,
}

impl CellSizeRequest {
    pub fn size(size: f64) -> Self {
        Self { cell_size: Some(size), ..Default::default() }
    }

    pub fn dimensions(width: f64, height: f64) -> Self {
        Self { width: Some(width), height: Some(height), ..Default::default() }
    }

    pub fn counts(columns: usize, rows: usize) -> Self {
        Self { columns, rows, ..Default::default() }
    }
}

/// Output of the resolver
#[derive(Debug, Clone)]
pub struct Resolved {
    pub extent: Extent,
    pub spec: CellSpec,
    pub diagnostics: Diagnostics,
}

/// Pick the working extent.
///
/// An explicit extent wins. Otherwise the union of the feature bounds and
/// the boundary bounds is used; a degenerate union is padded.
///
/// # Errors
/// `MissingExtent` when there is nothing to derive an extent from.
pub fn resolve_extent(
    extent: Option<&Extent>,
    feature_bounds: Option<Rect<f64>>,
    boundary: Option<&BoundarySource>,
) -> Result<Extent> {
    if let Some(e) = extent {
        return Ok(e.clone());
    }

    let boundary_bounds = boundary.and_then(|b| b.bounds());
    let corners = [feature_bounds, boundary_bounds]
        .into_iter()
        .flatten()
        .flat_map(|r| [r.min(), r.max()]);

    let rect = Extent::bounds_of(corners).ok_or(Error::MissingExtent)?;
    let derived = Extent::from_bounds(rect, DEGENERATE_PAD)?;

    match boundary.and_then(|b| b.frame.clone()) {
        Some(frame) => Ok(derived.with_frame(frame)),
        None => Ok(derived),
    }
}

/// Pick the cell sizing for `kind` over `extent`.
pub fn resolve_cell_spec(
    kind: TilingKind,
    request: &CellSizeRequest,
    extent: &Extent,
    diagnostics: &mut Diagnostics,
) -> Result<CellSpec> {
    match (request.columns, request.rows) {
        (0, 0) => {}
        (columns, rows) if columns > 0 && rows > 0 => {
            return CellSpec::new(kind, Sizing::Counts { columns, rows });
        }
        (columns, rows) => {
            let (name, value) = if columns == 0 { ("columns", columns) } else { ("rows", rows) };
            return Err(Error::invalid_size(name, value, "columns and rows must both be > 0"));
        }
    }

    if request.width.is_some() || request.height.is_some() {
        let width = request.width.or(request.height).unwrap_or_default();
        let height = request.height.or(request.width).unwrap_or_default();
        return CellSpec::new(kind, Sizing::Dimensions { width, height });
    }

    match request.cell_size {
        Some(size) if size.is_finite() && size > 0.0 => CellSpec::with_size(kind, size),
        _ => {
            let size = extent.short_side() / DEFAULT_CELLS_ACROSS;
            let notice = DiagnosticNotice::DefaultCellSize {
                size,
                extent_width: extent.width(),
                extent_height: extent.height(),
            };
            warn!("{}", notice);
            diagnostics.push(notice);
            CellSpec::with_size(kind, size)
        }
    }
}

/// Resolve extent and sizing in one go
pub fn resolve(
    kind: TilingKind,
    request: &CellSizeRequest,
    extent: Option<&Extent>,
    feature_bounds: Option<Rect<f64>>,
    boundary: Option<&BoundarySource>,
) -> Result<Resolved> {
    let extent = resolve_extent(extent, feature_bounds, boundary)?;
    let mut diagnostics = Diagnostics::new();
    let spec = resolve_cell_spec(kind, request, &extent, &mut diagnostics)?;
    Ok(Resolved { extent, spec, diagnostics })
}
