//! Facsimile zones
//!
//! A zone is the pixel bounding box that locates a notational element on the
//! scanned page image.
//!
//! ```text
//! (.) <ulx,uly>        (.)
//!
//!
//! (.)        <lrx,lry> (.)
//! ```

use serde::{Deserialize, Serialize};

/// Bounding box in page pixels
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(from = "RawZone")]
pub struct Zone {
    pub ulx: i32,
    pub uly: i32,
    pub lrx: i32,
    pub lry: i32,
}

/// Corners as they arrive from the host, possibly swapped
#[derive(Deserialize)]
struct RawZone {
    ulx: i32,
    uly: i32,
    lrx: i32,
    lry: i32,
}

impl From<RawZone> for Zone {
    fn from(raw: RawZone) -> Self {
        Zone::new(raw.ulx, raw.uly, raw.lrx, raw.lry)
    }
}

impl Zone {
    /// Create a zone; swapped corners are normalised
    pub fn new(ulx: i32, uly: i32, lrx: i32, lry: i32) -> Self {
        Self {
            ulx: ulx.min(lrx),
            uly: uly.min(lry),
            lrx: ulx.max(lrx),
            lry: uly.max(lry),
        }
    }

    /// Create from `[ulx, uly, lrx, lry]`
    pub fn from_bb(bb: [i32; 4]) -> Self {
        Self::new(bb[0], bb[1], bb[2], bb[3])
    }

    pub fn to_bb(&self) -> [i32; 4] {
        [self.ulx, self.uly, self.lrx, self.lry]
    }

    pub fn width(&self) -> i32 {
        self.lrx - self.ulx
    }

    pub fn height(&self) -> i32 {
        self.lry - self.uly
    }

    /// Centre point (may fall between pixels)
    pub fn centre(&self) -> (f64, f64) {
        (
            (self.ulx + self.lrx) as f64 / 2.0,
            (self.uly + self.lry) as f64 / 2.0,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.ulx && x <= self.lrx && y >= self.uly && y <= self.lry
    }

    /// Smallest zone enclosing both
    pub fn union(&self, other: &Zone) -> Zone {
        Zone {
            ulx: self.ulx.min(other.ulx),
            uly: self.uly.min(other.uly),
            lrx: self.lrx.max(other.lrx),
            lry: self.lry.max(other.lry),
        }
    }

    /// Smallest zone enclosing every zone in the iterator
    pub fn enclosing<'a, I>(zones: I) -> Option<Zone>
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        zones.into_iter().fold(None, |acc, z| match acc {
            None => Some(*z),
            Some(a) => Some(a.union(z)),
        })
    }

    /// Build a zone from a floating point rectangle, rounding to pixels
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Zone {
        Zone::new(
            left.round() as i32,
            top.round() as i32,
            (left + width).round() as i32,
            (top + height).round() as i32,
        )
    }
}
