//! Collaborator traits for hardware behind the controller.

use jg_core::{Fault, Point};

/// Valve actuation.
///
/// `aggregate_mask` reports the last committed state, not what playback
/// intended. The safety gate reads it.
pub trait ValveSink {
    /// Open exactly the valves at `points`; everything else closes.
    fn commit(&mut self, points: &[Point]);

    /// Close every valve.
    fn clear(&mut self);

    /// OR of all committed channel masks. Non-zero iff any valve is open.
    fn aggregate_mask(&self) -> u16;
}

/// Visualization of the active point set (LED matrix on the device).
pub trait DisplaySink {
    fn show(&mut self, points: &[Point]);
    fn clear(&mut self);
}

/// Receives the fault record when the controller halts.
pub trait FaultSink {
    fn halt(&mut self, fault: &Fault);
}

/// Raw output channel transport (I2C port expanders on the device).
pub trait PortWriter {
    fn write_port(&mut self, channel: u8, mask: u16);
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show(&mut self, _points: &[Point]) {}
    fn clear(&mut self) {}
}

impl<T: ValveSink + ?Sized> ValveSink for &mut T {
    fn commit(&mut self, points: &[Point]) {
        (**self).commit(points)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn aggregate_mask(&self) -> u16 {
        (**self).aggregate_mask()
    }
}

impl<T: PortWriter + ?Sized> PortWriter for &mut T {
    fn write_port(&mut self, channel: u8, mask: u16) {
        (**self).write_port(channel, mask)
    }
}

impl<F: FnMut(&Fault)> FaultSink for F {
    fn halt(&mut self, fault: &Fault) {
        self(fault)
    }
}
