//! # Tessera Core
//!
//! Core types shared by the Tessera lattice and binning engine.
//!
//! This crate provides:
//! - `Extent`: validated working rectangle with an optional frame
//! - `CRS`: reference frame labels used for mismatch detection
//! - Vector feature model (`PointFeature`, `Feature`, `BoundarySource`)
//! - Error taxonomy, diagnostic notices and cancellation handles

pub mod crs;
pub mod diagnostics;
pub mod error;
pub mod extent;
pub mod progress;
pub mod vector;

pub use crs::CRS;
pub use diagnostics::{DiagnosticNotice, Diagnostics};
pub use error::{Error, Result};
pub use extent::Extent;
pub use progress::{CancellationToken, NullMonitor, ProgressMonitor};
pub use vector::{
    AttributeValue, BoundarySource, Feature, FeatureCollection, PointCollection, PointFeature,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::diagnostics::{DiagnosticNotice, Diagnostics};
    pub use crate::error::{Error, Result};
    pub use crate::extent::Extent;
    pub use crate::progress::{CancellationToken, NullMonitor, ProgressMonitor};
    pub use crate::vector::{AttributeValue, BoundarySource, Feature, PointFeature};
}
