//! jg-core: stable foundation for the jetting grid controller.
//!
//! Contains:
//! - point (coordinates in the protocol coordinate system + byte codec)
//! - line (sparse lines, packed bitmask lines, unpack buffer)
//! - valves (fixed numbering of the physical valves on the grid)
//! - clock (millisecond clock sources)
//! - error (shared error types and fatal fault records)

pub mod clock;
pub mod error;
pub mod line;
pub mod point;
pub mod valves;

// Re-exports: nice ergonomics for downstream crates
pub use clock::{Clock, ManualClock, SystemClock, elapsed_ms};
pub use error::{CoreError, CoreResult, Fault, FaultCode};
pub use line::{
    LineBuffer, Line, MAX_POINTS_PER_LINE, PackedLine, PackedPoints, PackedTimeLine, pack_line,
};
pub use point::{AXIS_MAX, AXIS_MIN, BIAS, NULL_COORD, NUMEL_AXIS, Point, axis_contains};
pub use valves::{N_VALVES, VALVE_POINTS, ValveId, is_valve_location};
