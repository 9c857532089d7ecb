use crate::point::{AXIS_MAX, AXIS_MIN, Point};
use core::fmt;
use core::num::NonZeroU8;

/// Number of physical solenoid valves.
pub const N_VALVES: usize = 112;

/// Valves sit at the grid points where `x + y` is odd.
pub fn is_valve_location(p: Point) -> bool {
    p.in_range() && (i16::from(p.x) + i16::from(p.y)) & 1 == 1
}

const fn build_valve_table() -> [Point; N_VALVES] {
    let mut table = [Point::NULL; N_VALVES];
    let mut idx = 0;
    let mut x = AXIS_MIN;
    while x <= AXIS_MAX {
        let mut y = AXIS_MIN;
        while y <= AXIS_MAX {
            if (x + y) & 1 != 0 {
                table[idx] = Point::new(x, y);
                idx += 1;
            }
            y += 1;
        }
        x += 1;
    }
    table
}

/// Grid location of every valve, indexed by `valve number - 1`.
///
/// Numbering runs row by row (increasing x), then by increasing y.
pub const VALVE_POINTS: [Point; N_VALVES] = build_valve_table();

/// 1-based valve number.
///
/// - `NonZero` enables `Option<ValveId>` to be the size of a byte
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValveId(NonZeroU8);

impl ValveId {
    /// Valve with the given 1-based number, if it exists.
    pub fn new(number: u8) -> Option<Self> {
        if usize::from(number) > N_VALVES {
            return None;
        }
        NonZeroU8::new(number).map(Self)
    }

    pub fn number(self) -> u8 {
        self.0.get()
    }

    /// 0-based index into [`VALVE_POINTS`].
    pub fn index(self) -> usize {
        usize::from(self.0.get()) - 1
    }

    pub fn point(self) -> Point {
        VALVE_POINTS[self.index()]
    }

    /// Valve located at `p`, if any.
    pub fn from_point(p: Point) -> Option<Self> {
        if !is_valve_location(p) {
            return None;
        }
        VALVE_POINTS
            .iter()
            .position(|&v| v == p)
            .and_then(|idx| Self::new(idx as u8 + 1))
    }

    pub fn all() -> impl Iterator<Item = ValveId> {
        (1..=N_VALVES as u8).filter_map(Self::new)
    }
}

impl fmt::Debug for ValveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValveId({})", self.number())
    }
}

impl fmt::Display for ValveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_holds_every_valve_once() {
        let count = (AXIS_MIN..=AXIS_MAX)
            .flat_map(|x| (AXIS_MIN..=AXIS_MAX).map(move |y| Point::new(x, y)))
            .filter(|&p| is_valve_location(p))
            .count();
        assert_eq!(count, N_VALVES);
        assert!(VALVE_POINTS.iter().all(|&p| is_valve_location(p)));
    }

    #[test]
    fn numbering_round_trip() {
        for valve in ValveId::all() {
            assert_eq!(ValveId::from_point(valve.point()), Some(valve));
        }
        assert_eq!(ValveId::all().count(), N_VALVES);
    }

    #[test]
    fn first_and_last_valves() {
        assert_eq!(ValveId::new(1).unwrap().point(), Point::new(-7, -6));
        assert_eq!(ValveId::new(112).unwrap().point(), Point::new(7, 6));
    }

    #[test]
    fn invalid_numbers() {
        assert_eq!(ValveId::new(0), None);
        assert_eq!(ValveId::new(113), None);
        assert_eq!(ValveId::from_point(Point::new(0, 0)), None);
        assert_eq!(ValveId::from_point(Point::NULL), None);
    }

    #[test]
    fn option_valve_id_is_small() {
        assert_eq!(
            core::mem::size_of::<ValveId>(),
            core::mem::size_of::<Option<ValveId>>()
        );
    }
}
