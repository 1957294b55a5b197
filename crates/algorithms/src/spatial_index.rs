//! Envelope index shared by boundary filtering and point aggregation.
//!
//! Items are registered once by their bounding rectangle and queried many
//! times. Query results are returned sorted by item index, so callers that
//! stop at the first exact hit resolve ties in favour of the lowest index.

use geo::{Coord, Rect};
use rstar::{RTree, RTreeObject, AABB};
use smallvec::SmallVec;
use std::fmt;

/// Candidate list; lattices rarely yield more than a handful per query
pub type Candidates = SmallVec<[usize; 8]>;

#[derive(Debug, Clone)]
struct IndexedBox {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

fn rect_envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// R-tree over item bounding rectangles, bulk-loaded once
pub struct EnvelopeIndex {
    tree: RTree<IndexedBox>,
}

impl fmt::Debug for EnvelopeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeIndex").field("len", &self.tree.size()).finish()
    }
}

impl EnvelopeIndex {
    /// Bulk-load from `(index, bounds)` pairs.
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (usize, Rect<f64>)>,
    {
        let boxes: Vec<IndexedBox> = items
            .into_iter()
            .map(|(idx, rect)| IndexedBox { idx, env: rect_envelope(&rect) })
            .collect();
        Self { tree: RTree::bulk_load(boxes) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Items whose bounds contain `c` (boundary inclusive), ascending.
    pub fn candidates_at(&self, c: Coord<f64>) -> Candidates {
        let mut out: Candidates = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([c.x, c.y]))
            .map(|b| b.idx)
            .collect();
        out.sort_unstable();
        out
    }

    /// Items whose bounds intersect `rect` (boundary inclusive), ascending.
    pub fn candidates_in(&self, rect: &Rect<f64>) -> Candidates {
        let mut out: Candidates = self
            .tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|b| b.idx)
            .collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    fn two_by_two() -> EnvelopeIndex {
        EnvelopeIndex::build(vec![
            (0, rect(0.0, 0.0, 1.0, 1.0)),
            (1, rect(1.0, 0.0, 2.0, 1.0)),
            (2, rect(0.0, 1.0, 1.0, 2.0)),
            (3, rect(1.0, 1.0, 2.0, 2.0)),
        ])
    }

    #[test]
    fn test_point_query_interior() {
        let idx = two_by_two();
        assert_eq!(idx.len(), 4);
        assert_eq!(idx.candidates_at(Coord { x: 0.5, y: 1.5 }).as_slice(), &[2]);
    }

    #[test]
    fn test_point_query_shared_corner_sorted() {
        let idx = two_by_two();
        let c = idx.candidates_at(Coord { x: 1.0, y: 1.0 });
        assert_eq!(c.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_point_query_outside() {
        let idx = two_by_two();
        assert!(idx.candidates_at(Coord { x: 5.0, y: 5.0 }).is_empty());
    }

    #[test]
    fn test_rect_query() {
        let idx = two_by_two();
        let c = idx.candidates_in(&rect(1.2, 0.2, 1.8, 1.5));
        assert_eq!(c.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_empty_index() {
        let idx = EnvelopeIndex::build(Vec::new());
        assert!(idx.is_empty());
        assert!(idx.candidates_at(Coord { x: 0.0, y: 0.0 }).is_empty());
    }
}
