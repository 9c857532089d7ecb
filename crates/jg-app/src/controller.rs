//! The controller context and its top-level state machine.
//!
//! One [`Controller`] owns everything: program store, playback, upload
//! session, host port, safety gate and the hardware sinks. A frontend calls
//! [`Controller::feed`] with received bytes and [`Controller::tick`] from its
//! main loop, then forwards [`Controller::take_replies`] to the host and the
//! returned [`TickOutput`] to the pump enable pin.
//!
//! # States
//!
//! - `Off`: all valves closed, playback position kept.
//! - `Paused`: last activated valves stay open.
//! - `Running`: playback advances the program.
//! - `Uploading`: host commands are suspended while a program is received.
//! - `Halted`: a fatal fault occurred. Valves closed, pump disabled, input
//!   ignored. Only a new controller leaves this state.

use crate::command::Command;
use crate::config::ControllerConfig;
use crate::error::AppResult;
use crate::readings::Readings;
use jg_controls::{DisplaySink, FaultSink, IntervalTimer, PulseTrain, SafetyGate, ValveSink};
use jg_core::{Fault, FaultCode, Point};
use jg_program::{
    ActivationSink, PlaybackController, ProgramError, ProgramStore, load_preset,
};
use jg_upload::{HostPort, Upload, UploadStage};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Top-level controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    Off,
    Paused,
    Running,
    Uploading,
    Halted,
}

impl FsmState {
    /// Name reported by `fsm?`.
    pub fn name(self) -> &'static str {
        match self {
            FsmState::Off => "Off",
            FsmState::Paused => "Paused",
            FsmState::Running => "Running",
            FsmState::Uploading => "Uploading",
            FsmState::Halted => "Halted",
        }
    }
}

impl fmt::Display for FsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outputs of one loop pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutput {
    /// Whether the pump is allowed to run.
    pub pump_enable: bool,
    /// Level of the safety pulse pin.
    pub pulse_level: bool,
}

/// Routes activated lines to the valves and the display.
struct Actuation<'a, V, D> {
    valves: &'a mut V,
    display: &'a mut D,
}

impl<V: ValveSink, D: DisplaySink> ActivationSink for Actuation<'_, V, D> {
    fn activate(&mut self, _line_index: usize, points: &[Point]) {
        self.valves.commit(points);
        self.display.show(points);
    }
}

pub struct Controller<V, D, F> {
    config: ControllerConfig,
    store: ProgramStore,
    playback: PlaybackController,
    upload: Upload,
    port: HostPort,
    valves: V,
    display: D,
    faults: F,
    gate: SafetyGate,
    pulse: PulseTrain,
    command_timer: IntervalTimer,
    state: FsmState,
    replies: VecDeque<String>,
    readings: Readings,
    fault: Option<Fault>,
}

impl<V: ValveSink, D: DisplaySink, F: FaultSink> Controller<V, D, F> {
    /// Start a controller: load the startup preset, prime playback and enter
    /// `Off`.
    pub fn new(
        config: ControllerConfig,
        valves: V,
        display: D,
        faults: F,
        now_ms: u32,
    ) -> AppResult<Self> {
        config.validate()?;

        let mut store = ProgramStore::with_capacity(config.max_lines);
        load_preset(&mut store, config.startup_preset)?;
        let mut playback = PlaybackController::new();
        playback.prime_start();

        let mut controller = Self {
            pulse: PulseTrain::from_period(config.safety_pulse_period_ms)?,
            command_timer: IntervalTimer::new(config.command_poll_interval_ms, now_ms),
            upload: Upload::new(config.upload_timeout_ms),
            config,
            store,
            playback,
            port: HostPort::new(),
            valves,
            display,
            faults,
            gate: SafetyGate::new(),
            state: FsmState::Off,
            replies: VecDeque::new(),
            readings: Readings::default(),
            fault: None,
        };
        controller.enter_state(FsmState::Off, now_ms);
        info!(
            program = controller.store.name(),
            capacity = controller.store.capacity(),
            "controller started"
        );
        Ok(controller)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn store(&self) -> &ProgramStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn valves(&self) -> &V {
        &self.valves
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Fault that halted the controller, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// 1-based playback position as reported to the host.
    pub fn position(&self) -> usize {
        self.playback.position() + 1
    }

    pub fn set_readings(&mut self, readings: Readings) {
        self.readings = readings;
    }

    /// Queue bytes received from the host. Dropped once halted.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.state != FsmState::Halted {
            self.port.feed(bytes);
        }
    }

    /// Drain the replies queued for the host.
    pub fn take_replies(&mut self) -> Vec<String> {
        self.replies.drain(..).collect()
    }

    /// Abort a running upload. The fail-safe program is installed on the next
    /// tick.
    pub fn cancel_upload(&mut self) {
        if self.state == FsmState::Uploading {
            self.upload.cancel();
        }
    }

    /// Run one pass of the cooperative loop.
    pub fn tick(&mut self, now_ms: u32) -> TickOutput {
        if !matches!(self.state, FsmState::Uploading | FsmState::Halted)
            && self.command_timer.poll(now_ms)
        {
            self.poll_command(now_ms);
        }

        self.update_state(now_ms);

        let pump_enable =
            self.state != FsmState::Halted && self.gate.pump_enable(self.valves.aggregate_mask());
        let pulse_level = self.pulse.tick(pump_enable, now_ms);
        TickOutput {
            pump_enable,
            pulse_level,
        }
    }

    /// Latch `Halted`: close everything, report the fault, ignore all input.
    pub fn halt(&mut self, fault: Fault) {
        if self.state == FsmState::Halted {
            return;
        }
        error!(code = %fault.code, reason = %fault.message, "controller halted");
        self.valves.clear();
        self.display.clear();
        self.port.discard();
        self.faults.halt(&fault);
        self.replies.push_back(fault.to_string());
        self.fault = Some(fault);
        self.state = FsmState::Halted;
    }

    /// Leave the current state and enter `next`. No-op for the current state
    /// and once halted.
    pub fn transition_to(&mut self, next: FsmState, now_ms: u32) {
        if next == self.state || self.state == FsmState::Halted {
            return;
        }
        if next == FsmState::Halted {
            self.halt(Fault::new(FaultCode::USER_HALT, "Halted by user command."));
            return;
        }
        debug!(from = %self.state, to = %next, "state transition");
        self.exit_state();
        if self.state == FsmState::Halted {
            return;
        }
        self.state = next;
        self.enter_state(next, now_ms);
    }

    fn enter_state(&mut self, state: FsmState, now_ms: u32) {
        match state {
            FsmState::Off => {
                self.valves.clear();
                self.display.clear();
            }
            FsmState::Uploading => self.upload.enter(now_ms, &mut self.store),
            FsmState::Paused | FsmState::Running | FsmState::Halted => {}
        }
    }

    fn exit_state(&mut self) {
        if self.state == FsmState::Uploading {
            let result = self.upload.exit(
                &mut self.store,
                &mut self.playback,
                self.config.failsafe_duration_ms,
            );
            if let Err(e) = result {
                self.halt_on(e);
                return;
            }
            // Frames of an abandoned upload must not reach the command reader.
            if *self.upload.stage() != UploadStage::Succeeded {
                debug!(pending = self.port.pending(), "discarding rest of failed upload");
                self.port.discard();
            }
        }
    }

    fn update_state(&mut self, now_ms: u32) {
        match self.state {
            FsmState::Running => {
                let mut sink = Actuation {
                    valves: &mut self.valves,
                    display: &mut self.display,
                };
                if let Err(e) = self.playback.update(now_ms, &self.store, &mut sink) {
                    self.halt_on(e);
                }
            }
            FsmState::Uploading => {
                match self
                    .upload
                    .update(now_ms, &mut self.port, &mut self.store, &mut self.replies)
                {
                    Ok(stage) if stage.is_terminal() => {
                        self.transition_to(FsmState::Off, now_ms);
                    }
                    Ok(_) => {}
                    Err(fault) => self.halt(fault.to_fault()),
                }
            }
            FsmState::Off | FsmState::Paused | FsmState::Halted => {}
        }
    }

    fn poll_command(&mut self, now_ms: u32) {
        let token = match self.port.poll_text() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                self.halt(Fault::new(FaultCode::FRAMING_OVERRUN, e.to_string()));
                return;
            }
        };

        match Command::parse(&token) {
            Some(cmd) => self.dispatch(cmd, now_ms),
            None => warn!(command = %token, "unknown command ignored"),
        }
    }

    /// Execute one host command.
    pub fn dispatch(&mut self, cmd: Command, now_ms: u32) {
        if self.state == FsmState::Halted {
            return;
        }
        debug!(?cmd, "command");

        match cmd {
            Command::Identify => self.reply(self.config.identity.clone()),
            Command::Position => self.reply_position(),
            Command::ProgramInfo => {
                self.reply(format!("{}\t{}", self.store.name(), self.store.line_count()))
            }
            Command::Status => self.reply(self.readings.status_line(self.position())),
            Command::Upload => self.transition_to(FsmState::Uploading, now_ms),
            Command::Play => self.transition_to(FsmState::Running, now_ms),
            Command::Stop => {
                self.transition_to(FsmState::Off, now_ms);
                self.reply_position();
            }
            Command::Pause => {
                self.transition_to(FsmState::Paused, now_ms);
                self.reply_position();
            }
            Command::PrevLine => self.seek(now_ms, |pb, now, store, sink| {
                pb.goto_prev_line(now, store, sink)
            }),
            Command::NextLine => self.seek(now_ms, |pb, now, store, sink| {
                pb.goto_next_line(now, store, sink)
            }),
            Command::Goto(index) => self.seek(now_ms, |pb, now, store, sink| {
                pb.goto_line(index, now, store, sink)
            }),
            Command::Preset(index) => self.apply_preset(index),
            Command::LineBuffer => {
                let line = join_points(self.playback.line_buffer().iter().copied());
                self.reply(line);
            }
            Command::FullProgram => self.reply_full_program(),
            Command::FsmState => self.reply(self.state.name().to_string()),
            Command::Halt => {
                self.halt(Fault::new(FaultCode::USER_HALT, "Halted by user command."))
            }
            Command::OverrideSafety => self.gate.set_override(true),
            Command::RestoreSafety => self.gate.set_override(false),
        }
    }

    fn seek<G>(&mut self, now_ms: u32, go: G)
    where
        G: FnOnce(
            &mut PlaybackController,
            u32,
            &ProgramStore,
            &mut Actuation<'_, V, D>,
        ) -> Result<(), ProgramError>,
    {
        let mut sink = Actuation {
            valves: &mut self.valves,
            display: &mut self.display,
        };
        if let Err(e) = go(&mut self.playback, now_ms, &self.store, &mut sink) {
            self.halt_on(e);
            return;
        }
        self.reply_position();
    }

    fn apply_preset(&mut self, index: u16) {
        match load_preset(&mut self.store, index) {
            Ok(()) => {
                self.playback.prime_start();
                self.reply(self.store.name().to_string());
            }
            Err(ProgramError::UnknownPreset(n)) => {
                self.reply(format!("ERROR: Unknown preset {n}"));
            }
            Err(e) if e.is_fatal() => self.halt_on(e),
            Err(e) => self.reply(format!("ERROR: {e}")),
        }
    }

    fn reply_full_program(&mut self) {
        self.reply(format!("{}\t{}", self.store.name(), self.store.line_count()));
        let lines: Vec<String> = self
            .store
            .lines()
            .enumerate()
            .map(|(idx, line)| {
                format!(
                    "{}\t{}\t{}",
                    idx + 1,
                    line.duration_ms,
                    join_points(line.packed.points())
                )
            })
            .collect();
        self.replies.extend(lines);
    }

    fn reply_position(&mut self) {
        self.reply(self.position().to_string());
    }

    fn reply(&mut self, line: String) {
        self.replies.push_back(line);
    }

    fn halt_on(&mut self, e: ProgramError) {
        if e.is_fatal() {
            self.halt(e.to_fault());
        } else {
            warn!(error = %e, "program error");
        }
    }
}

impl<V, D, F> fmt::Debug for Controller<V, D, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("store", &self.store)
            .field("position", &self.playback.position())
            .field("fault", &self.fault)
            .finish()
    }
}

fn join_points<I: IntoIterator<Item = Point>>(points: I) -> String {
    points
        .into_iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}
