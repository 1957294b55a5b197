//! # Tessera Algorithms
//!
//! Lattice generation and point binning.
//!
//! ## Modules
//!
//! - **tessellation**: rectangle, hexagon, triangle and circle-pack lattices,
//!   extent and cell size resolution, boundary filtering
//! - **binning**: point-to-cell aggregation, weights and output records
//! - **spatial_index**: R-tree over cell envelopes

pub mod binning;
pub mod spatial_index;
pub mod tessellation;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binning::{
        aggregate, assemble, bin_points, generate_lattice, AggregateParams, AssembleParams,
        BinningOutput, BinningParams, CellRecords, Lattice, PointSource, Weight, WeightEvaluator,
        WeightExpr,
    };
    pub use crate::tessellation::{
        generate, resolve, Cell, CellId, CellShape, CellSizeRequest, CellSpec, LatticeParams,
        TilingKind,
    };
    pub use tessera_core::prelude::*;
}
