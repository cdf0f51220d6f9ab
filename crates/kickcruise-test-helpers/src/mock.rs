//! Mock hardware collaborators.

use kickcruise_core::{ControlMode, SpeedSample, SpeedSource, StatusIndicator, ThrottleCommand, ThrottleSink};

/// A [`SpeedSource`] replaying a pre-scripted sample sequence.
#[derive(Debug)]
pub struct ScriptedSource {
    samples: std::vec::IntoIter<SpeedSample>,
}

impl ScriptedSource {
    /// Wrap a scripted ride.
    pub fn new(samples: Vec<SpeedSample>) -> Self {
        Self {
            samples: samples.into_iter(),
        }
    }
}

impl SpeedSource for ScriptedSource {
    fn next_sample(&mut self) -> Option<SpeedSample> {
        self.samples.next()
    }
}

/// A [`ThrottleSink`] recording every duty it was handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Applied duties, one per cycle.
    pub duties: Vec<u8>,
}

impl ThrottleSink for RecordingSink {
    fn apply(&mut self, cmd: ThrottleCommand) {
        self.duties.push(cmd.duty);
    }
}

/// A [`StatusIndicator`] recording the sequence of mode changes.
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    /// Modes in the order they were indicated.
    pub modes: Vec<ControlMode>,
}

impl StatusIndicator for RecordingIndicator {
    fn mode_changed(&mut self, mode: ControlMode) {
        self.modes.push(mode);
    }
}
