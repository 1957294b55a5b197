//! Non-fatal notices
//!
//! Default substitutions and per-record data problems are reported here
//! instead of failing the call.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticNotice {
    /// No usable cell size was given; one was derived from the extent
    DefaultCellSize {
        size: f64,
        extent_width: f64,
        extent_height: f64,
    },
    /// Points with non-finite coordinates were ignored
    SkippedPoints { count: u64 },
    /// Valid points that fell outside every cell
    UnmatchedPoints { count: u64 },
    /// The caller cancelled; results are partial
    Cancelled { points_processed: u64 },
    /// The lattice (after boundary filtering) has no cells
    EmptyLattice,
}

impl fmt::Display for DiagnosticNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticNotice::DefaultCellSize { size, extent_width, extent_height } => write!(
                f,
                "cell size not set, using {} (1/250 of the short side of a {} x {} extent)",
                size, extent_width, extent_height
            ),
            DiagnosticNotice::SkippedPoints { count } => {
                write!(f, "skipped {} point(s) with non-finite coordinates", count)
            }
            DiagnosticNotice::UnmatchedPoints { count } => {
                write!(f, "{} point(s) fell outside every cell", count)
            }
            DiagnosticNotice::Cancelled { points_processed } => {
                write!(f, "cancelled after {} point(s); result is partial", points_processed)
            }
            DiagnosticNotice::EmptyLattice => f.write_str("lattice has no cells"),
        }
    }
}

/// Accumulates notices for one invocation
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    notices: Vec<DiagnosticNotice>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: DiagnosticNotice) {
        self.notices.push(notice);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.notices.extend(other.notices);
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticNotice> {
        self.notices.iter()
    }

    pub fn into_vec(self) -> Vec<DiagnosticNotice> {
        self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display() {
        let n = DiagnosticNotice::SkippedPoints { count: 3 };
        assert_eq!(n.to_string(), "skipped 3 point(s) with non-finite coordinates");

        let d = DiagnosticNotice::DefaultCellSize {
            size: 0.4,
            extent_width: 100.0,
            extent_height: 200.0,
        };
        assert!(d.to_string().contains("0.4"));
    }

    #[test]
    fn test_diagnostics_accumulate() {
        let mut a = Diagnostics::new();
        a.push(DiagnosticNotice::EmptyLattice);
        let mut b = Diagnostics::new();
        b.push(DiagnosticNotice::UnmatchedPoints { count: 1 });
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.into_vec()[1], DiagnosticNotice::UnmatchedPoints { count: 1 });
    }
}
