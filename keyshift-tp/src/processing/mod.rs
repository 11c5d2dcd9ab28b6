//! Audio processing collaborators: the external pitch shifter and the
//! per-request temporary workspace it reads from and writes to.

pub mod pitch_shifter;
pub mod workspace;

pub use pitch_shifter::{FfmpegPitchShifter, PitchShifter, ShiftError};
pub use workspace::RequestWorkspace;
