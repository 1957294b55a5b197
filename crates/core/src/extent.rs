//! Working extents

use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::crs::CRS;
use crate::error::{Error, Result};

/// Axis-aligned bounding rectangle with an optional reference frame.
///
/// Always satisfies `min_x < max_x` and `min_y < max_y` with finite
/// coordinates. Fields are private so the invariant cannot be broken after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExtent")]
pub struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    frame: Option<CRS>,
}

/// Unvalidated wire form, checked on deserialization
#[derive(Deserialize)]
struct RawExtent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    #[serde(default)]
    frame: Option<CRS>,
}

impl TryFrom<RawExtent> for Extent {
    type Error = Error;

    fn try_from(raw: RawExtent) -> Result<Self> {
        let extent = Extent::new(raw.min_x, raw.min_y, raw.max_x, raw.max_y)?;
        Ok(Extent { frame: raw.frame, ..extent })
    }
}

impl Extent {
    /// Create an extent, validating the corner ordering.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let finite = min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite();
        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(Error::InvalidExtent { min_x, min_y, max_x, max_y });
        }
        Ok(Self { min_x, min_y, max_x, max_y, frame: None })
    }

    /// Create an extent from a `geo::Rect`
    pub fn from_rect(rect: Rect<f64>) -> Result<Self> {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Attach a reference frame
    pub fn with_frame(mut self, frame: CRS) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Bounding rectangle of a set of coordinates.
    ///
    /// Non-finite coordinates are ignored. Returns `None` when no finite
    /// coordinate is present. The result may be degenerate (zero width or
    /// height); use [`Extent::from_bounds`] to turn it into a usable extent.
    pub fn bounds_of<I>(coords: I) -> Option<Rect<f64>>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let mut acc: Option<(Coord<f64>, Coord<f64>)> = None;
        for c in coords {
            if !(c.x.is_finite() && c.y.is_finite()) {
                continue;
            }
            acc = Some(match acc {
                None => (c, c),
                Some((lo, hi)) => (
                    Coord { x: lo.x.min(c.x), y: lo.y.min(c.y) },
                    Coord { x: hi.x.max(c.x), y: hi.y.max(c.y) },
                ),
            });
        }
        acc.map(|(lo, hi)| Rect::new(lo, hi))
    }

    /// Build an extent from possibly-degenerate bounds.
    ///
    /// A zero-width or zero-height axis is padded by `pad` on each side.
    pub fn from_bounds(rect: Rect<f64>, pad: f64) -> Result<Self> {
        let (mut min, mut max) = (rect.min(), rect.max());
        if max.x - min.x <= 0.0 {
            min.x -= pad;
            max.x += pad;
        }
        if max.y - min.y <= 0.0 {
            min.y -= pad;
            max.y += pad;
        }
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// Extent of a set of geometries
    pub fn from_geometries<'a, G, I>(geoms: I) -> Option<Rect<f64>>
    where
        G: BoundingRect<f64> + 'a,
        G::Output: Into<Option<Rect<f64>>>,
        I: IntoIterator<Item = &'a G>,
    {
        let corners = geoms
            .into_iter()
            .filter_map(|g| -> Option<Rect<f64>> { g.bounding_rect().into() })
            .flat_map(|r| [r.min(), r.max()]);
        Self::bounds_of(corners)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn frame(&self) -> Option<&CRS> {
        self.frame.as_ref()
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Length of the shorter side
    pub fn short_side(&self) -> f64 {
        self.width().min(self.height())
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Boundary-inclusive point test
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest extent covering both. Keeps `self`'s frame.
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            frame: self.frame.clone(),
        }
    }

    /// Grow (or shrink, for negative `d`) every side by `d`.
    pub fn expand_by(&self, d: f64) -> Result<Extent> {
        let grown = Extent::new(self.min_x - d, self.min_y - d, self.max_x + d, self.max_y + d)?;
        Ok(Extent { frame: self.frame.clone(), ..grown })
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}
