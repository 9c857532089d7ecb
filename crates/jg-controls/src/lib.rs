//! Actuation side of the jetting grid controller.
//!
//! This crate sits between playback and hardware. It owns the rules that
//! decide what actually reaches the outputs:
//! - Valve states are committed as per-channel bitmasks ([`ValveBank`])
//! - The pump may only run while a valve is open ([`SafetyGate`])
//! - The pump enable line is a pulse train, never a steady level ([`PulseTrain`])
//! - Periodic work in the cooperative loop is gated by [`IntervalTimer`]
//!
//! Hardware access stays behind the traits in [`sinks`].

pub mod error;
pub mod safety;
pub mod sampled;
pub mod sinks;
pub mod valve_bank;

pub use error::{ControlError, ControlResult};
pub use safety::{PulseTrain, SafetyGate};
pub use sampled::IntervalTimer;
pub use sinks::{DisplaySink, FaultSink, NullDisplay, PortWriter, ValveSink};
pub use valve_bank::{N_CHANNELS, ValveBank, valve_channel};
