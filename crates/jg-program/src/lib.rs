//! Program storage and playback for the jetting grid.
//!
//! A program is an ordered list of timed lines. It is loaded once (upload or
//! preset) and then replayed in a repeating cycle:
//!
//! - [`ProgramStore`] owns the pre-sized line buffer and the program name
//! - [`PlaybackController`] tracks the active line and when it was activated
//! - [`presets`] builds the programs that ship with the firmware

pub mod error;
pub mod playback;
pub mod presets;
pub mod store;

pub use error::{ProgramError, ProgramResult};
pub use playback::{ActivationSink, PlaybackController};
pub use presets::{FAILSAFE_NAME, N_PRESETS, load_failsafe, load_preset};
pub use store::{MAX_LINES, MAX_NAME_LEN, ProgramStore};
