//! Planar reference frames
//!
//! Tessera never reprojects. A frame is only carried along so that inputs
//! declared in different frames can be rejected before any geometry is built.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// Parse a user-facing frame name.
    ///
    /// Accepts `EPSG:<code>`, the OGC URN form
    /// (`urn:ogc:def:crs:EPSG::<code>`), `CRS84`, PROJ strings starting with
    /// `+proj=`, and falls back to treating anything else as WKT.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidParameter {
                name: "crs",
                value: String::new(),
                reason: "empty frame name".into(),
            });
        }

        let upper = s.to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }

        let code = upper
            .strip_prefix("EPSG:")
            .or_else(|| upper.rsplit_once("EPSG::").map(|(_, c)| c));
        if let Some(code) = code {
            return code
                .trim()
                .parse::<u32>()
                .map(Self::from_epsg)
                .map_err(|_| Error::InvalidParameter {
                    name: "crs",
                    value: s.to_string(),
                    reason: "EPSG code is not an integer".into(),
                });
        }

        if s.starts_with("+proj=") {
            return Ok(Self::from_proj(s));
        }

        Ok(Self::from_wkt(s))
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // Textual comparison is imperfect but never reports a false match
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a.trim() == b.trim();
        }

        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a.trim() == b.trim();
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Check that every declared frame agrees with the others.
///
/// Undeclared frames (`None`) are skipped: a caller that does not label its
/// inputs takes responsibility for aligning them upstream.
pub fn ensure_same_frame<'a, I>(frames: I) -> Result<Option<&'a CRS>>
where
    I: IntoIterator<Item = Option<&'a CRS>>,
{
    let mut reference: Option<&CRS> = None;
    for frame in frames.into_iter().flatten() {
        match reference {
            None => reference = Some(frame),
            Some(r) if !r.is_equivalent(frame) => {
                return Err(Error::CoordinateFrameMismatch(r.identifier(), frame.identifier()));
            }
            Some(_) => {}
        }
    }
    Ok(reference)
}
