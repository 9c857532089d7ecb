//! Sparse and packed representations of a single program line.
//!
//! - [`Line`] is the sparse form used while a line is being received: an
//!   ordered list of points terminated by the first null point.
//! - [`PackedLine`] is the dense form used for storage: one 16-bit row mask per
//!   grid row, constant size regardless of how many points are active.
//! - [`LineBuffer`] is the scratch buffer a packed line is unpacked into.

use crate::error::{CoreError, CoreResult};
use crate::point::{AXIS_MIN, BIAS, NUMEL_AXIS, Point};
use core::fmt;

/// One slot per grid position.
pub const MAX_POINTS_PER_LINE: usize = NUMEL_AXIS * NUMEL_AXIS;

/// Bits of a row mask that correspond to grid columns.
const ROW_MASK: u16 = (1 << NUMEL_AXIS) - 1;

/// Sparse line: points plus the time the line stays active.
///
/// Storage holds one extra slot so the list is always null-terminated.
#[derive(Clone)]
pub struct Line {
    /// Time the line remains active during playback [ms]
    pub duration_ms: u32,
    points: [Point; MAX_POINTS_PER_LINE + 1],
    cursor: usize,
}

impl Line {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            points: [Point::NULL; MAX_POINTS_PER_LINE + 1],
            cursor: 0,
        }
    }

    /// Build a line from an iterator of points.
    pub fn from_points<I>(duration_ms: u32, points: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut line = Self::new(duration_ms);
        for p in points {
            line.push(p)?;
        }
        Ok(line)
    }

    /// Reset to an empty line, reusing the storage.
    pub fn reset(&mut self, duration_ms: u32) {
        self.duration_ms = duration_ms;
        self.cursor = 0;
        self.points[0] = Point::NULL;
    }

    /// Append a point and keep the list terminated.
    pub fn push(&mut self, p: Point) -> CoreResult<()> {
        if self.cursor >= MAX_POINTS_PER_LINE {
            return Err(CoreError::LineFull {
                capacity: MAX_POINTS_PER_LINE,
            });
        }
        self.points[self.cursor] = p;
        self.cursor += 1;
        self.points[self.cursor] = Point::NULL;
        Ok(())
    }

    /// Points up to, not including, the first null point.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied().take_while(|p| !p.is_null())
    }

    pub fn len(&self) -> usize {
        self.points().count()
    }

    pub fn is_empty(&self) -> bool {
        self.points[0].is_null()
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
            .field("duration_ms", &self.duration_ms)
            .field("points", &self.points().collect::<Vec<_>>())
            .finish()
    }
}

/// Dense bitmask form of a line.
///
/// Bit `y + BIAS` of row `x + BIAS` is set iff point `(x, y)` is active.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackedLine([u16; NUMEL_AXIS]);

impl PackedLine {
    pub const EMPTY: PackedLine = PackedLine([0; NUMEL_AXIS]);

    /// Build from raw row masks. Bits outside the grid are discarded.
    pub fn from_rows(rows: [u16; NUMEL_AXIS]) -> Self {
        Self(rows.map(|r| r & ROW_MASK))
    }

    pub fn rows(&self) -> &[u16; NUMEL_AXIS] {
        &self.0
    }

    /// Flag `p` as active.
    pub fn set(&mut self, p: Point) -> CoreResult<()> {
        let (row, col) = p
            .grid_index()
            .ok_or(CoreError::OutOfRangeCoordinate { x: p.x, y: p.y })?;
        self.0[row] |= 1 << col;
        Ok(())
    }

    pub fn contains(&self, p: Point) -> bool {
        match p.grid_index() {
            Some((row, col)) => self.0[row] & (1 << col) != 0,
            None => false,
        }
    }

    /// Number of active points.
    pub fn count(&self) -> usize {
        self.0.iter().map(|r| r.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&r| r == 0)
    }

    /// Active points in increasing row-then-column order.
    pub fn points(&self) -> PackedPoints<'_> {
        PackedPoints {
            rows: &self.0,
            row: 0,
            col: 0,
        }
    }
}

impl fmt::Debug for PackedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|r| format!("{r:015b}")))
            .finish()
    }
}

/// Lazy iterator over the active points of a [`PackedLine`].
pub struct PackedPoints<'a> {
    rows: &'a [u16; NUMEL_AXIS],
    row: usize,
    col: usize,
}

impl Iterator for PackedPoints<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        while self.row < NUMEL_AXIS {
            let mask = self.rows[self.row];
            while self.col < NUMEL_AXIS {
                let col = self.col;
                self.col += 1;
                if mask & (1 << col) != 0 {
                    return Some(Point::new(
                        self.row as i8 + AXIS_MIN,
                        col as i8 - BIAS,
                    ));
                }
            }
            self.row += 1;
            self.col = 0;
        }
        None
    }
}

/// Pack a sparse line, walking it up to the null sentinel.
///
/// An off-grid point yields [`CoreError::OutOfRangeCoordinate`], which is
/// fatal to the caller.
pub fn pack_line(line: &Line) -> CoreResult<PackedLine> {
    let mut packed = PackedLine::EMPTY;
    for p in line.points() {
        packed.set(p)?;
    }
    Ok(packed)
}

/// Storage unit of a program: a packed line and its duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackedTimeLine {
    /// Time the line remains active during playback [ms]
    pub duration_ms: u32,
    pub packed: PackedLine,
}

impl PackedTimeLine {
    pub fn new(duration_ms: u32, packed: PackedLine) -> Self {
        Self {
            duration_ms,
            packed,
        }
    }

    pub fn from_line(line: &Line) -> CoreResult<Self> {
        Ok(Self::new(line.duration_ms, pack_line(line)?))
    }
}

/// Scratch buffer that a packed line is unpacked into.
///
/// The slice returned by [`unpack`](Self::unpack) borrows the buffer, so it
/// cannot outlive the next call. The buffer is always null-terminated.
#[derive(Clone)]
pub struct LineBuffer {
    points: [Point; MAX_POINTS_PER_LINE + 1],
    len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            points: [Point::NULL; MAX_POINTS_PER_LINE + 1],
            len: 0,
        }
    }

    pub fn unpack(&mut self, packed: &PackedLine) -> &[Point] {
        let mut len = 0;
        for p in packed.points() {
            self.points[len] = p;
            len += 1;
        }
        self.points[len] = Point::NULL;
        self.len = len;
        &self.points[..len]
    }

    /// Result of the last unpack.
    pub fn points(&self) -> &[Point] {
        &self.points[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.points[0] = Point::NULL;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.points()).finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::point::AXIS_MAX;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn grid_points() -> impl Strategy<Value = BTreeSet<Point>> {
        prop::collection::vec(any::<bool>(), MAX_POINTS_PER_LINE).prop_map(|flags| {
            flags
                .iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .map(|(i, _)| {
                    Point::new(
                        (i / NUMEL_AXIS) as i8 + AXIS_MIN,
                        (i % NUMEL_AXIS) as i8 + AXIS_MIN,
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn unpack_recovers_packed_set(points in grid_points(), duration in any::<u16>()) {
            let line = Line::from_points(u32::from(duration), points.iter().copied()).unwrap();
            let stored = PackedTimeLine::from_line(&line).unwrap();
            prop_assert_eq!(stored.duration_ms, u32::from(duration));

            let mut buf = LineBuffer::new();
            let recovered: BTreeSet<Point> = buf.unpack(&stored.packed).iter().copied().collect();
            prop_assert!(recovered.iter().all(|p| p.x <= AXIS_MAX && p.y <= AXIS_MAX));
            prop_assert_eq!(recovered, points);
        }

        #[test]
        fn lazy_and_buffered_unpack_agree(rows in prop::array::uniform15(any::<u16>())) {
            let packed = PackedLine::from_rows(rows);
            let mut buf = LineBuffer::new();
            let lazy: Vec<Point> = packed.points().collect();
            prop_assert_eq!(buf.unpack(&packed), lazy.as_slice());
        }
    }
}
