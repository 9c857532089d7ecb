//! Time-driven playback through a stored program.
//!
//! Two advance policies coexist:
//! - **Automatic** ([`PlaybackController::update`]): once the active line's
//!   duration has elapsed, move to the next line, wrapping to line 0 after the
//!   last one. Programs are repeating cycles.
//! - **Manual** (`goto_*`): seek immediately, clamped to the program bounds.
//!   Manual stepping never wraps.

use crate::{ProgramResult, ProgramStore};
use jg_core::{LineBuffer, Point, elapsed_ms};
use tracing::{debug, trace};

/// Receives the point set of every line that becomes active.
pub trait ActivationSink {
    fn activate(&mut self, line_index: usize, points: &[Point]);
}

impl<F> ActivationSink for F
where
    F: FnMut(usize, &[Point]),
{
    fn activate(&mut self, line_index: usize, points: &[Point]) {
        self(line_index, points)
    }
}

/// Playback position and activation timing.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    /// Active line; `None` until the first activation after priming.
    position: Option<usize>,
    /// Timestamp of the last activation [ms]
    activated_at_ms: u32,
    buffer: LineBuffer,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`update`](Self::update) activate line 0 regardless of
    /// timing.
    pub fn prime_start(&mut self) {
        self.position = None;
    }

    /// Prime and forget the last active set.
    pub fn reset(&mut self) {
        self.prime_start();
        self.buffer.clear();
    }

    /// Whether a line has been activated since the last priming.
    pub fn is_started(&self) -> bool {
        self.position.is_some()
    }

    /// Zero-based active line. Reads 0 while primed.
    pub fn position(&self) -> usize {
        self.position.unwrap_or(0)
    }

    /// Points of the most recently activated line.
    pub fn line_buffer(&self) -> &[Point] {
        self.buffer.points()
    }

    /// Advance when it is time. Returns `true` when a line was activated.
    pub fn update<S: ActivationSink>(
        &mut self,
        now_ms: u32,
        store: &ProgramStore,
        sink: &mut S,
    ) -> ProgramResult<bool> {
        if store.is_empty() {
            return Ok(false);
        }

        let next = match self.position {
            None => 0,
            Some(pos) => {
                let line = store.get_line(pos)?;
                if elapsed_ms(now_ms, self.activated_at_ms) < line.duration_ms {
                    return Ok(false);
                }
                if pos + 1 >= store.line_count() {
                    0
                } else {
                    pos + 1
                }
            }
        };

        self.activate(next, now_ms, store, sink)?;
        Ok(true)
    }

    pub fn goto_next_line<S: ActivationSink>(
        &mut self,
        now_ms: u32,
        store: &ProgramStore,
        sink: &mut S,
    ) -> ProgramResult<()> {
        self.goto_line(self.position().saturating_add(1), now_ms, store, sink)
    }

    pub fn goto_prev_line<S: ActivationSink>(
        &mut self,
        now_ms: u32,
        store: &ProgramStore,
        sink: &mut S,
    ) -> ProgramResult<()> {
        self.goto_line(self.position().saturating_sub(1), now_ms, store, sink)
    }

    /// Seek to `index`, clamped to the last line, and activate it now.
    pub fn goto_line<S: ActivationSink>(
        &mut self,
        index: usize,
        now_ms: u32,
        store: &ProgramStore,
        sink: &mut S,
    ) -> ProgramResult<()> {
        if store.is_empty() {
            return Ok(());
        }
        let clamped = index.min(store.line_count() - 1);
        if clamped != index {
            trace!(requested = index, clamped, "seek clamped");
        }
        self.activate(clamped, now_ms, store, sink)
    }

    fn activate<S: ActivationSink>(
        &mut self,
        index: usize,
        now_ms: u32,
        store: &ProgramStore,
        sink: &mut S,
    ) -> ProgramResult<()> {
        let line = store.get_line(index)?;
        self.position = Some(index);
        self.activated_at_ms = now_ms;

        let points = self.buffer.unpack(&line.packed);
        debug!(
            line = index,
            points = points.len(),
            duration_ms = line.duration_ms,
            "line activated"
        );
        sink.activate(index, points);
        Ok(())
    }
}
