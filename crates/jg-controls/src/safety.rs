//! Pump safety interlock.
//!
//! The pump downstream of the grid must never run against a closed grid. The
//! gate derives the enable signal from the committed valve state; the pulse
//! train turns it into the output the external watchdog relay expects. A
//! stuck level, high or low, drops the relay.

use crate::error::{ControlError, ControlResult};
use jg_core::elapsed_ms;
use tracing::warn;

/// Derives pump enable from the aggregate valve mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyGate {
    override_active: bool,
}

impl SafetyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` iff the override is active or any valve is open.
    pub fn pump_enable(&self, aggregate_mask: u16) -> bool {
        self.override_active || aggregate_mask != 0
    }

    pub fn set_override(&mut self, active: bool) {
        if active && !self.override_active {
            warn!("safety override engaged, pump may run with all valves closed");
        }
        self.override_active = active;
    }

    pub fn is_overridden(&self) -> bool {
        self.override_active
    }
}

/// Square wave on the pump enable line.
///
/// While enabled the level toggles every half period, starting high on the
/// first enabled tick. The moment `enable` drops the level is forced low and
/// the phase restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTrain {
    /// Half period [ms]
    half_period_ms: u32,
    /// Timestamp of the last toggle; `None` while disabled.
    last_toggle_ms: Option<u32>,
    level: bool,
}

impl PulseTrain {
    /// Create a pulse train with the given half period.
    ///
    /// # Errors
    ///
    /// Returns error if `half_period_ms` is zero.
    pub fn new(half_period_ms: u32) -> ControlResult<Self> {
        if half_period_ms == 0 {
            return Err(ControlError::InvalidArg {
                what: "half period must be positive",
            });
        }
        Ok(Self {
            half_period_ms,
            last_toggle_ms: None,
            level: false,
        })
    }

    /// Create a pulse train from the full period.
    pub fn from_period(period_ms: u32) -> ControlResult<Self> {
        Self::new(period_ms / 2)
    }

    pub fn half_period_ms(&self) -> u32 {
        self.half_period_ms
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Advance to `now_ms` and return the output level.
    pub fn tick(&mut self, enable: bool, now_ms: u32) -> bool {
        if !enable {
            self.level = false;
            self.last_toggle_ms = None;
            return false;
        }

        match self.last_toggle_ms {
            None => {
                self.level = true;
                self.last_toggle_ms = Some(now_ms);
            }
            Some(t) if elapsed_ms(now_ms, t) >= self.half_period_ms => {
                self.level = !self.level;
                self.last_toggle_ms = Some(now_ms);
            }
            Some(_) => {}
        }
        self.level
    }
}
