//! Break and exercise session state machines.
//!
//! ## State Transitions
//!
//! ```text
//! BreakSession:    Scheduled -> Active -> Completed
//!                  Scheduled | Active -> Skipped
//!
//! ExerciseSession: Active <-> Paused -> Completed
//!                  Active -> Completed
//! ```
//!
//! Every transition takes the current instant and returns
//! `Option<Event>`. An illegal transition returns `None` and leaves the
//! session untouched, so a UI racing button taps against state changes never
//! sees an error.

mod break_session;
mod exercise_session;

pub use break_session::{BreakSession, BreakState, MIN_BREAK_SECS};
pub use exercise_session::{ExerciseSession, ExerciseState};
