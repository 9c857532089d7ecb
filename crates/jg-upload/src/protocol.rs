//! Staged upload of a program from the host.
//!
//! ```text
//! AwaitingName --Name--> AwaitingLineCount --LineCount--> ReceivingLines
//! ReceivingLines --Line--> ReceivingLines
//! ReceivingLines --EndOfProgram--> Succeeded
//! any non-terminal stage --Fail(e)--> Failed(e)
//! ```
//!
//! The store is cleared on [`Upload::enter`] and filled line by line. Whatever
//! the outcome, [`Upload::exit`] leaves a runnable program behind: the
//! uploaded one on success, the fail-safe program otherwise.

use crate::error::{UploadError, UploadResult};
use crate::framing::HostPort;
use jg_core::{Line, Point, elapsed_ms};
use jg_program::{PlaybackController, ProgramError, ProgramResult, ProgramStore, load_failsafe};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Time allowed for a complete upload [ms]
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u32 = 4000;

/// Outbound text lines to the host.
pub trait ReplySink {
    fn reply(&mut self, line: String);
}

impl ReplySink for Vec<String> {
    fn reply(&mut self, line: String) {
        self.push(line);
    }
}

impl ReplySink for VecDeque<String> {
    fn reply(&mut self, line: String) {
        self.push_back(line);
    }
}

/// Upload progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStage {
    AwaitingName,
    AwaitingLineCount,
    ReceivingLines,
    Succeeded,
    Failed(UploadError),
}

/// Inputs that move an upload between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Name,
    LineCount,
    Line,
    EndOfProgram,
    Fail(UploadError),
}

impl UploadStage {
    /// Stage after `event`. Terminal stages absorb every event; events that
    /// do not apply to a stage leave it unchanged.
    pub fn next(self, event: UploadEvent) -> UploadStage {
        use UploadEvent as E;
        use UploadStage as S;

        match (self, event) {
            (stage @ (S::Succeeded | S::Failed(_)), _) => stage,
            (_, E::Fail(e)) => S::Failed(e),
            (S::AwaitingName, E::Name) => S::AwaitingLineCount,
            (S::AwaitingLineCount, E::LineCount) => S::ReceivingLines,
            (S::ReceivingLines, E::Line) => S::ReceivingLines,
            (S::ReceivingLines, E::EndOfProgram) => S::Succeeded,
            (stage, _) => stage,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStage::Succeeded | UploadStage::Failed(_))
    }
}

/// Parse an integer the way C `atoi` does: skip leading whitespace, accept an
/// optional sign, read digits up to the first non-digit. No digits reads as 0.
/// Negative values read as 0, large values saturate.
pub fn parse_atoi(s: &str) -> usize {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0usize, |acc, d| {
            acc.saturating_mul(10).saturating_add(usize::from(d - b'0'))
        });
    if negative { 0 } else { value }
}

/// State of one upload session.
#[derive(Debug, Clone)]
pub struct Upload {
    stage: UploadStage,
    entered_at_ms: u32,
    timeout_ms: u32,
    promised_lines: usize,
    line: Line,
    /// Set once [`exit`](Self::exit) has run for the current session.
    exited: bool,
}

impl Upload {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            stage: UploadStage::AwaitingName,
            entered_at_ms: 0,
            timeout_ms,
            promised_lines: 0,
            line: Line::new(0),
            exited: true,
        }
    }

    pub fn stage(&self) -> &UploadStage {
        &self.stage
    }

    pub fn promised_lines(&self) -> usize {
        self.promised_lines
    }

    /// Whether a session was entered and has not exited yet.
    pub fn is_active(&self) -> bool {
        !self.exited
    }

    /// Start a session: clear the store and arm the deadline.
    pub fn enter(&mut self, now_ms: u32, store: &mut ProgramStore) {
        store.clear();
        self.stage = UploadStage::AwaitingName;
        self.entered_at_ms = now_ms;
        self.promised_lines = 0;
        self.line.reset(0);
        self.exited = false;
        info!(timeout_ms = self.timeout_ms, "upload started");
    }

    /// Process at most one input unit, then check the deadline.
    ///
    /// Returns the stage reached. `Err` is fatal: the caller must halt.
    pub fn update<R: ReplySink>(
        &mut self,
        now_ms: u32,
        port: &mut HostPort,
        store: &mut ProgramStore,
        replies: &mut R,
    ) -> UploadResult<UploadStage> {
        if self.stage.is_terminal() {
            return Ok(self.stage.clone());
        }

        match self.stage {
            UploadStage::AwaitingName => {
                if let Some(token) = port.poll_text()? {
                    store.set_name(&token);
                    replies.reply(store.name().to_owned());
                    debug!(program = store.name(), "upload name received");
                    self.advance(UploadEvent::Name);
                }
            }
            UploadStage::AwaitingLineCount => {
                if let Some(token) = port.poll_text()? {
                    self.receive_line_count(&token, store, replies);
                }
            }
            UploadStage::ReceivingLines => {
                if let Some(frame) = port.poll_frame()? {
                    self.receive_frame(&frame, store, replies)?;
                }
            }
            UploadStage::Succeeded | UploadStage::Failed(_) => {}
        }

        let elapsed = elapsed_ms(now_ms, self.entered_at_ms);
        if !self.stage.is_terminal() && elapsed > self.timeout_ms {
            replies.reply("ERROR: Loading in protocol program timed out.".to_owned());
            self.advance(UploadEvent::Fail(UploadError::Timeout {
                elapsed_ms: elapsed,
            }));
        }

        Ok(self.stage.clone())
    }

    /// Abort a running session from outside.
    pub fn cancel(&mut self) {
        if !self.stage.is_terminal() {
            self.advance(UploadEvent::Fail(UploadError::Cancelled));
        }
    }

    /// Finish the session.
    ///
    /// Installs the fail-safe program unless the upload succeeded, then primes
    /// playback at line 0. Runs at most once per [`enter`](Self::enter).
    pub fn exit(
        &mut self,
        store: &mut ProgramStore,
        playback: &mut PlaybackController,
        failsafe_duration_ms: u32,
    ) -> ProgramResult<()> {
        if self.exited {
            return Ok(());
        }
        self.exited = true;

        if self.stage != UploadStage::Succeeded {
            // Cancelled or abandoned mid-way still counts as a failure.
            if !self.stage.is_terminal() {
                self.stage = UploadStage::Failed(UploadError::Cancelled);
            }
            warn!(stage = ?self.stage, "upload failed, installing fail-safe program");
            load_failsafe(store, failsafe_duration_ms)?;
        } else {
            info!(
                program = store.name(),
                count = store.line_count(),
                "upload succeeded"
            );
        }

        playback.prime_start();
        Ok(())
    }

    fn advance(&mut self, event: UploadEvent) {
        let stage = std::mem::replace(&mut self.stage, UploadStage::AwaitingName);
        self.stage = stage.next(event);
    }

    fn receive_line_count<R: ReplySink>(
        &mut self,
        token: &str,
        store: &ProgramStore,
        replies: &mut R,
    ) {
        let requested = parse_atoi(token);
        let max = store.capacity();
        if requested > max {
            replies.reply(format!(
                "ERROR: Protocol program exceeds maximum number of lines. \
                 Requested were {requested} lines, but the maximum is {max}."
            ));
            self.advance(UploadEvent::Fail(UploadError::CapacityExceeded {
                requested,
                max,
            }));
            return;
        }

        self.promised_lines = requested;
        replies.reply(requested.to_string());
        debug!(count = requested, "upload line count received");
        self.advance(UploadEvent::LineCount);
    }

    fn receive_frame<R: ReplySink>(
        &mut self,
        frame: &[u8],
        store: &mut ProgramStore,
        replies: &mut R,
    ) -> UploadResult<()> {
        match frame {
            [] => {
                let received = store.line_count();
                if received != self.promised_lines {
                    replies.reply(format!(
                        "ERROR: Protocol program received incorrect number of lines. \
                         Promised were {} lines, but {received} were received.",
                        self.promised_lines
                    ));
                    self.advance(UploadEvent::Fail(UploadError::CountMismatch {
                        promised: self.promised_lines,
                        received,
                    }));
                } else {
                    replies.reply("Success!".to_owned());
                    self.advance(UploadEvent::EndOfProgram);
                }
            }
            [_] => {
                replies.reply(format!(
                    "ERROR: Protocol program line is malformed. Received {} byte.",
                    frame.len()
                ));
                self.advance(UploadEvent::Fail(UploadError::MalformedFrame {
                    len: frame.len(),
                }));
            }
            [hi, lo, points @ ..] => {
                self.line.reset(u32::from(u16::from_be_bytes([*hi, *lo])));
                for &byte in points {
                    self.line.push(Point::from_byte(byte)).map_err(ProgramError::from)?;
                }

                match store.add_line(&self.line) {
                    Ok(()) => self.advance(UploadEvent::Line),
                    Err(ProgramError::CapacityExceeded { capacity }) => {
                        let requested = store.line_count() + 1;
                        replies.reply(format!(
                            "ERROR: Protocol program exceeds maximum number of lines. \
                             Requested were {requested} lines, but the maximum is {capacity}."
                        ));
                        self.advance(UploadEvent::Fail(UploadError::CapacityExceeded {
                            requested,
                            max: capacity,
                        }));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}
