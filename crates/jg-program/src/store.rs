//! Bounded program storage.

use crate::{ProgramError, ProgramResult};
use jg_core::{Line, PackedTimeLine};
use tracing::debug;

/// Default program capacity. Sized for the controller's RAM.
pub const MAX_LINES: usize = 5000;

/// Longest program name kept, in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// Append-then-replay store of packed program lines.
///
/// The line buffer is allocated once at construction and reused by every
/// subsequent program; only the explicit length changes.
#[derive(Clone)]
pub struct ProgramStore {
    lines: Box<[PackedTimeLine]>,
    len: usize,
    name: String,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LINES)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Program capacity must be positive");
        Self {
            lines: vec![PackedTimeLine::default(); capacity].into_boxed_slice(),
            len: 0,
            name: String::with_capacity(MAX_NAME_LEN + 1),
        }
    }

    /// Forget the current program. Buffer contents are left as-is.
    pub fn clear(&mut self) {
        self.len = 0;
        self.name.clear();
    }

    /// Set the program name, truncated to [`MAX_NAME_LEN`] bytes.
    pub fn set_name(&mut self, name: &str) {
        let mut end = name.len().min(MAX_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.name.clear();
        self.name.push_str(&name[..end]);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pack and append a sparse line.
    pub fn add_line(&mut self, line: &Line) -> ProgramResult<()> {
        self.ensure_room()?;
        let packed = PackedTimeLine::from_line(line)?;
        self.push(packed);
        Ok(())
    }

    /// Append an already packed line.
    pub fn add_packed(&mut self, line: PackedTimeLine) -> ProgramResult<()> {
        self.ensure_room()?;
        self.push(line);
        Ok(())
    }

    /// Replace the whole program in one step.
    ///
    /// The current program is left untouched when `lines` does not fit.
    pub fn replace(&mut self, name: &str, lines: &[PackedTimeLine]) -> ProgramResult<()> {
        if lines.len() > self.capacity() {
            return Err(ProgramError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.clear();
        self.set_name(name);
        self.lines[..lines.len()].copy_from_slice(lines);
        self.len = lines.len();
        debug!(program = name, count = self.len, "program replaced");
        Ok(())
    }

    pub fn get_line(&self, index: usize) -> ProgramResult<&PackedTimeLine> {
        self.lines[..self.len]
            .get(index)
            .ok_or(ProgramError::IndexOutOfRange {
                index,
                len: self.len,
            })
    }

    pub fn line_count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PackedTimeLine> {
        self.lines[..self.len].iter()
    }

    fn ensure_room(&self) -> ProgramResult<()> {
        if self.len >= self.capacity() {
            return Err(ProgramError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    fn push(&mut self, line: PackedTimeLine) {
        self.lines[self.len] = line;
        self.len += 1;
    }
}

impl Default for ProgramStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgramStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramStore")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jg_core::{CoreError, Point};

    fn line(duration_ms: u32, points: &[(i8, i8)]) -> Line {
        Line::from_points(duration_ms, points.iter().map(|&(x, y)| Point::new(x, y))).unwrap()
    }

    #[test]
    fn add_and_get() {
        let mut store = ProgramStore::with_capacity(4);
        store.add_line(&line(500, &[(0, 0)])).unwrap();
        store.add_line(&line(300, &[(1, 1), (2, 2)])).unwrap();

        assert_eq!(store.line_count(), 2);
        assert_eq!(store.get_line(0).unwrap().duration_ms, 500);
        assert_eq!(store.get_line(1).unwrap().packed.count(), 2);
        assert_eq!(store.lines().count(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut store = ProgramStore::with_capacity(2);
        store.add_line(&line(1, &[])).unwrap();
        store.add_line(&line(1, &[])).unwrap();
        assert_eq!(
            store.add_line(&line(1, &[])),
            Err(ProgramError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(store.line_count(), 2);
    }

    #[test]
    fn out_of_range_index() {
        let mut store = ProgramStore::with_capacity(4);
        store.add_line(&line(1, &[])).unwrap();
        assert_eq!(
            store.get_line(1),
            Err(ProgramError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn off_grid_point_is_rejected_and_not_stored() {
        let mut store = ProgramStore::with_capacity(4);
        let bad = Line::from_points(1, [Point::from_byte(0xff)]).unwrap();
        assert_eq!(
            store.add_line(&bad),
            Err(ProgramError::Core(CoreError::OutOfRangeCoordinate { x: 8, y: 8 }))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn clear_resets_count_and_name() {
        let mut store = ProgramStore::with_capacity(4);
        store.set_name("Test");
        store.add_line(&line(1, &[(0, 1)])).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.name(), "");
        assert_eq!(store.capacity(), 4);
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let mut store = ProgramStore::with_capacity(1);
        let name = "é".repeat(40);
        store.set_name(&name);
        assert!(store.name().len() <= MAX_NAME_LEN);
        assert_eq!(store.name().chars().count(), MAX_NAME_LEN / 2);
    }

    #[test]
    fn replace_keeps_program_when_too_large() {
        let mut store = ProgramStore::with_capacity(1);
        store.set_name("Keep");
        store.add_line(&line(1, &[])).unwrap();

        let lines = [PackedTimeLine::default(); 2];
        assert!(store.replace("New", &lines).is_err());
        assert_eq!(store.name(), "Keep");
        assert_eq!(store.line_count(), 1);
    }
}
