//! Switch between rayon and plain iterators.
//!
//! With the `parallel` feature, lattice post-processing (boundary filtering)
//! runs on rayon's pool. Without it, `into_par_iter()` is a plain
//! `into_iter()`, so call sites compile unchanged and the `.filter()` /
//! `.collect()` chain resolves to `std::iter::Iterator`. Both paths preserve
//! input order when collecting into a `Vec`, which keeps cell output
//! row-major.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
