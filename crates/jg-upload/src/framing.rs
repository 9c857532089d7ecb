//! Inbound byte stream framing.
//!
//! The host link carries two kinds of units over the same stream:
//! - text tokens, terminated by `\n` (commands, upload name and line count)
//! - binary frames, terminated by the [`EOL`] sentinel (upload lines)
//!
//! The reader decides which kind it expects next. Units are returned strictly
//! in arrival order; bytes of a unit that has not been terminated yet stay
//! queued.

use crate::error::FramingError;
use jg_core::MAX_POINTS_PER_LINE;
use std::collections::VecDeque;
use tracing::{error, trace};

/// End-of-line sentinel of a binary frame. No valid point byte is `0xFF`.
pub const EOL: [u8; 3] = [0xff, 0xff, 0xff];

/// Longest text token, terminator excluded [bytes]
pub const TEXT_CAPACITY: usize = 64;

/// Longest binary frame, sentinel excluded: duration plus a full line [bytes]
pub const FRAME_CAPACITY: usize = 2 + MAX_POINTS_PER_LINE;

/// Receive side of the host link.
#[derive(Debug, Default, Clone)]
pub struct HostPort {
    inbound: VecDeque<u8>,
}

impl HostPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes received from the transport.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    /// Number of queued bytes.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Drop everything queued.
    pub fn discard(&mut self) {
        self.inbound.clear();
    }

    /// Take the next text token, if one is complete.
    ///
    /// A trailing `\r` and surrounding whitespace are stripped.
    pub fn poll_text(&mut self) -> Result<Option<String>, FramingError> {
        let window = self.inbound.len().min(TEXT_CAPACITY + 1);
        match self.inbound.iter().take(window).position(|&b| b == b'\n') {
            Some(end) => {
                let raw: Vec<u8> = self.inbound.drain(..=end).take(end).collect();
                let token = String::from_utf8_lossy(&raw).trim().to_owned();
                trace!(token = %token, "text token");
                Ok(Some(token))
            }
            None if self.inbound.len() > TEXT_CAPACITY => {
                self.inbound.clear();
                error!(capacity = TEXT_CAPACITY, "text token overrun");
                Err(FramingError::Overrun {
                    capacity: TEXT_CAPACITY,
                })
            }
            None => Ok(None),
        }
    }

    /// Take the next binary frame, if one is complete.
    ///
    /// An empty frame (a bare sentinel) is returned as an empty vector.
    pub fn poll_frame(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        let window = self.inbound.len().min(FRAME_CAPACITY + EOL.len());
        let found = (0..window.saturating_sub(EOL.len() - 1)).find(|&i| {
            EOL.iter()
                .enumerate()
                .all(|(k, &b)| self.inbound[i + k] == b)
        });

        match found {
            Some(start) => {
                let frame: Vec<u8> = self.inbound.drain(..start).collect();
                self.inbound.drain(..EOL.len());
                trace!(len = frame.len(), "binary frame");
                Ok(Some(frame))
            }
            None if self.inbound.len() >= FRAME_CAPACITY + EOL.len() => {
                self.inbound.clear();
                error!(capacity = FRAME_CAPACITY, "binary frame overrun");
                Err(FramingError::Overrun {
                    capacity: FRAME_CAPACITY,
                })
            }
            None => Ok(None),
        }
    }
}
