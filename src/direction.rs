//! Relative position, routing direction and anchor resolution.
//!
//! Everything here is a pure function of two absolute rectangles: `a` is the
//! start node, `b` the end node.
//!
//! The plane around `a`, grown by [`CLEARANCE_MARGIN`], is cut into a 3x3
//! grid and `b` is placed into one of its cells:
//!
//! ```text
//!        L    M    R
//!   T   TL   TM   TR
//!   M   ML  [a]   MR
//!   B   BL   BM   BR
//! ```

use crate::error::{ConnectorError, Result};
use crate::geometry::{Point, Rect};
use crate::model::Direction;
use std::fmt;

/// Clearance added around the start rectangle before classification.
pub const CLEARANCE_MARGIN: f32 = 16.0;

/// Cell of the 3x3 grid that the end rectangle falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativePosition {
    TL,
    TM,
    TR,
    ML,
    MM,
    MR,
    BL,
    BM,
    BR,
    /// At least one rectangle has non-finite coordinates or negative size.
    Unknown,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Band {
    Before,
    Overlap,
    After,
}

impl RelativePosition {
    fn from_bands(vertical: Band, horizontal: Band) -> Self {
        use Band::*;
        match (vertical, horizontal) {
            (Before, Before) => Self::TL,
            (Before, Overlap) => Self::TM,
            (Before, After) => Self::TR,
            (Overlap, Before) => Self::ML,
            (Overlap, Overlap) => Self::MM,
            (Overlap, After) => Self::MR,
            (After, Before) => Self::BL,
            (After, Overlap) => Self::BM,
            (After, After) => Self::BR,
        }
    }

    /// Two-letter code, or `"UNKNOWN"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TL => "TL",
            Self::TM => "TM",
            Self::TR => "TR",
            Self::ML => "ML",
            Self::MM => "MM",
            Self::MR => "MR",
            Self::BL => "BL",
            Self::BM => "BM",
            Self::BR => "BR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// `b` is left of `a`.
    pub fn is_left(&self) -> bool {
        matches!(self, Self::TL | Self::ML | Self::BL)
    }

    /// `b` is right of `a`.
    pub fn is_right(&self) -> bool {
        matches!(self, Self::TR | Self::MR | Self::BR)
    }

    /// `b` is above `a`.
    pub fn is_top(&self) -> bool {
        matches!(self, Self::TL | Self::TM | Self::TR)
    }

    /// `b` is below `a`.
    pub fn is_bottom(&self) -> bool {
        matches!(self, Self::BL | Self::BM | Self::BR)
    }

    /// The code contains `L` or `R`.
    pub fn has_horizontal(&self) -> bool {
        self.is_left() || self.is_right()
    }

    /// The code contains `T` or `B`.
    pub fn has_vertical(&self) -> bool {
        self.is_top() || self.is_bottom()
    }

    /// Overlapping or unclassifiable: no connector can be routed.
    pub fn is_unroutable(&self) -> bool {
        matches!(self, Self::MM | Self::Unknown)
    }
}

impl fmt::Display for RelativePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn band(start: f32, end: f32, lo: f32, hi: f32) -> Band {
    if end < lo {
        Band::Before
    } else if start > hi {
        Band::After
    } else {
        Band::Overlap
    }
}

/// Classify where `b` sits relative to `a` grown by [`CLEARANCE_MARGIN`].
pub fn classify_relative_position(a: &Rect, b: &Rect) -> RelativePosition {
    if !a.is_valid() || !b.is_valid() {
        return RelativePosition::Unknown;
    }
    let grown = a.expanded(CLEARANCE_MARGIN);
    let vertical = band(b.y, b.bottom(), grown.y, grown.bottom());
    let horizontal = band(b.x, b.right(), grown.x, grown.right());
    RelativePosition::from_bands(vertical, horizontal)
}

fn direction_for(position: RelativePosition) -> Direction {
    if position.has_horizontal() {
        Direction::Horizontal
    } else if position.has_vertical() {
        Direction::Vertical
    } else {
        Direction::Invalid
    }
}

/// Direction implied by the relative position. Horizontal wins on diagonals.
pub fn resolve_direction(a: &Rect, b: &Rect) -> Direction {
    direction_for(classify_relative_position(a, b))
}

/// Keep `requested` while the geometry still allows it, otherwise fall back
/// to [`resolve_direction`].
pub fn reconcile_direction(requested: Direction, a: &Rect, b: &Rect) -> Direction {
    let position = classify_relative_position(a, b);
    match requested {
        Direction::Horizontal if position.has_horizontal() => Direction::Horizontal,
        Direction::Vertical if position.has_vertical() => Direction::Vertical,
        _ => direction_for(position),
    }
}

/// Start and end anchor of a connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub start: Point,
    pub end: Point,
}

impl Anchors {
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

/// Compute anchors on the facing sides of `a` and `b`, pushed outward by the
/// margins.
///
/// # Errors
///
/// [`ConnectorError::Configuration`] for [`Direction::Invalid`].
pub fn anchor_points(
    a: &Rect,
    b: &Rect,
    start_margin: f32,
    end_margin: f32,
    direction: Direction,
) -> Result<Anchors> {
    let position = classify_relative_position(a, b);
    match direction {
        Direction::Horizontal => {
            let b_is_right = if position.has_horizontal() {
                position.is_right()
            } else {
                b.center_x() >= a.center_x()
            };
            let (start_x, end_x) = if b_is_right {
                (a.right() + start_margin, b.x - end_margin)
            } else {
                (a.x - start_margin, b.right() + end_margin)
            };
            Ok(Anchors {
                start: Point::new(start_x, a.center_y()),
                end: Point::new(end_x, b.center_y()),
            })
        }
        Direction::Vertical => {
            let b_is_below = if position.has_vertical() {
                position.is_bottom()
            } else {
                b.center_y() >= a.center_y()
            };
            let (start_y, end_y) = if b_is_below {
                (a.bottom() + start_margin, b.y - end_margin)
            } else {
                (a.y - start_margin, b.bottom() + end_margin)
            };
            Ok(Anchors {
                start: Point::new(a.center_x(), start_y),
                end: Point::new(b.center_x(), end_y),
            })
        }
        Direction::Invalid => Err(ConnectorError::Configuration(format!(
            "no routing direction for relative position {position}"
        ))),
    }
}
