//! Points in the protocol coordinate system (PCS).
//!
//! The grid spans `AXIS_MIN..=AXIS_MAX` on both axes. A point travels over the
//! wire as a single byte: the biased x in the high nibble, the biased y in the
//! low nibble.

use core::fmt;

/// Smallest valid coordinate on either axis.
pub const AXIS_MIN: i8 = -7;
/// Largest valid coordinate on either axis.
pub const AXIS_MAX: i8 = 7;
/// Number of grid positions per axis.
pub const NUMEL_AXIS: usize = (AXIS_MAX - AXIS_MIN + 1) as usize;
/// Offset that maps `AXIS_MIN` onto nibble value 0.
pub const BIAS: i8 = -AXIS_MIN;
/// Sentinel coordinate. Never a valid position.
pub const NULL_COORD: i8 = i8::MIN;

/// Returns `true` when `c` lies on the grid axis.
pub fn axis_contains(c: i8) -> bool {
    (AXIS_MIN..=AXIS_MAX).contains(&c)
}

/// A single point in the PCS.
///
/// A point is null when either coordinate equals [`NULL_COORD`]. Null points
/// terminate sparse lines.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i8,
    pub y: i8,
}

impl Point {
    pub const NULL: Point = Point {
        x: NULL_COORD,
        y: NULL_COORD,
    };

    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub const fn is_null(self) -> bool {
        self.x == NULL_COORD || self.y == NULL_COORD
    }

    /// Non-null with both coordinates on the grid.
    pub fn in_range(self) -> bool {
        !self.is_null() && axis_contains(self.x) && axis_contains(self.y)
    }

    /// Encode into the wire byte `(x + BIAS) << 4 | (y + BIAS)`.
    ///
    /// # Panics
    ///
    /// Panics if either biased coordinate does not fit in a nibble. Callers
    /// only encode points that are on the grid.
    pub fn to_byte(self) -> u8 {
        let bx = i16::from(self.x) + i16::from(BIAS);
        let by = i16::from(self.y) + i16::from(BIAS);
        assert!(
            (0..=15).contains(&bx) && (0..=15).contains(&by),
            "point {self:?} does not fit in a nibble pair"
        );
        ((bx as u8) << 4) | by as u8
    }

    /// Decode a wire byte. Total over all byte values; the result is not
    /// necessarily [`in_range`](Self::in_range).
    pub fn from_byte(byte: u8) -> Self {
        Self {
            x: (byte >> 4) as i8 - BIAS,
            y: (byte & 0x0f) as i8 - BIAS,
        }
    }

    /// Zero-based `(row, column)` of this point in the grid, if in range.
    pub fn grid_index(self) -> Option<(usize, usize)> {
        if self.in_range() {
            Some(((self.x + BIAS) as usize, (self.y + BIAS) as usize))
        } else {
            None
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "(null)")
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}
