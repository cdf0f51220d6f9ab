//! Convenience re-exports for the test suite.

pub use crate::mock::{RecordingIndicator, RecordingSink, ScriptedSource};
pub use crate::ride::{BRAKE_RAW, Ride};
