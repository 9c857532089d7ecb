//! Committed valve state as per-channel bitmasks.
//!
//! The valve drivers are 16-bit port expanders. Valve `n` sits on channel
//! `(n - 1) / 16`, bit `(n - 1) % 16`.

use crate::sinks::{PortWriter, ValveSink};
use jg_core::{N_VALVES, Point, ValveId};
use tracing::{debug, trace, warn};

/// Output channels needed for every valve.
pub const N_CHANNELS: usize = N_VALVES.div_ceil(16);

/// Channel index and bit mask of a valve.
pub fn valve_channel(valve: ValveId) -> (usize, u16) {
    let idx = valve.index();
    (idx / 16, 1 << (idx % 16))
}

/// Valve outputs driven through a [`PortWriter`].
#[derive(Debug)]
pub struct ValveBank<P> {
    port: P,
    committed: [u16; N_CHANNELS],
    halted: bool,
}

impl<P: PortWriter> ValveBank<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            committed: [0; N_CHANNELS],
            halted: false,
        }
    }

    /// Committed mask of each channel.
    pub fn channels(&self) -> &[u16; N_CHANNELS] {
        &self.committed
    }

    pub fn is_open(&self, valve: ValveId) -> bool {
        let (ch, bit) = valve_channel(valve);
        self.committed[ch] & bit != 0
    }

    /// Open valves in valve-number order.
    pub fn open_valves(&self) -> impl Iterator<Item = ValveId> + '_ {
        ValveId::all().filter(|&v| self.is_open(v))
    }

    /// Close everything and refuse further commits.
    pub fn halt(&mut self) {
        self.write_all([0; N_CHANNELS]);
        self.halted = true;
        warn!("valve bank halted");
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn write_all(&mut self, masks: [u16; N_CHANNELS]) {
        for (ch, &mask) in masks.iter().enumerate() {
            self.port.write_port(ch as u8, mask);
        }
        self.committed = masks;
    }
}

impl<P: PortWriter> ValveSink for ValveBank<P> {
    fn commit(&mut self, points: &[Point]) {
        if self.halted {
            trace!("commit ignored while halted");
            return;
        }
        let mut masks = [0u16; N_CHANNELS];
        for &p in points {
            if let Some(valve) = ValveId::from_point(p) {
                let (ch, bit) = valve_channel(valve);
                masks[ch] |= bit;
            }
        }
        self.write_all(masks);
        debug!(open = masks.iter().map(|m| m.count_ones()).sum::<u32>(), "valves committed");
    }

    fn clear(&mut self) {
        self.write_all([0; N_CHANNELS]);
    }

    fn aggregate_mask(&self) -> u16 {
        self.committed.iter().fold(0, |acc, &m| acc | m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jg_core::VALVE_POINTS;

    #[derive(Default)]
    struct Port {
        writes: Vec<(u8, u16)>,
    }

    impl PortWriter for Port {
        fn write_port(&mut self, channel: u8, mask: u16) {
            self.writes.push((channel, mask));
        }
    }

    fn valve(n: u8) -> ValveId {
        ValveId::new(n).unwrap()
    }

    #[test]
    fn channel_mapping() {
        assert_eq!(N_CHANNELS, 7);
        assert_eq!(valve_channel(valve(1)), (0, 0x0001));
        assert_eq!(valve_channel(valve(16)), (0, 0x8000));
        assert_eq!(valve_channel(valve(17)), (1, 0x0001));
        assert_eq!(valve_channel(valve(112)), (6, 0x8000));
    }

    #[test]
    fn commit_sets_only_valve_locations() {
        let mut bank = ValveBank::new(Port::default());
        // (0, 0) has even x + y and is not a valve.
        bank.commit(&[valve(1).point(), Point::new(0, 0), valve(20).point()]);

        assert_eq!(bank.channels()[0], 0x0001);
        assert_eq!(bank.channels()[1], 0x0008);
        assert_eq!(bank.open_valves().collect::<Vec<_>>(), vec![valve(1), valve(20)]);
        assert_eq!(bank.port().writes.len(), N_CHANNELS);
    }

    #[test]
    fn commit_replaces_previous_state() {
        let mut bank = ValveBank::new(Port::default());
        bank.commit(&VALVE_POINTS);
        assert!(bank.channels().iter().all(|&m| m == 0xffff));

        bank.commit(&[valve(3).point()]);
        assert_eq!(bank.open_valves().collect::<Vec<_>>(), vec![valve(3)]);
    }

    #[test]
    fn non_valve_points_leave_mask_zero() {
        let mut bank = ValveBank::new(Port::default());
        bank.commit(&[Point::new(0, 0), Point::new(7, 7)]);
        assert_eq!(bank.aggregate_mask(), 0);
    }

    #[test]
    fn halt_clears_and_latches() {
        let mut bank = ValveBank::new(Port::default());
        bank.commit(&VALVE_POINTS);
        bank.halt();
        assert_eq!(bank.aggregate_mask(), 0);

        bank.commit(&VALVE_POINTS);
        assert_eq!(bank.aggregate_mask(), 0);
        assert!(bank.is_halted());

        let port = bank.into_port();
        assert!(port.writes.iter().rev().take(N_CHANNELS).all(|&(_, m)| m == 0));
    }
}
