//! Narrow interfaces to the hardware collaborators.
//!
//! The control algorithms never touch pins or timers; they see a sample
//! source and a throttle sink. That keeps the core exercisable against
//! replayed or simulated sample sequences.

use tracing::debug;

use crate::controller::CruiseController;
use crate::types::{ControlMode, ControlOutput, SpeedSample, ThrottleCommand};

/// Supplies one decoded sample per tick; `None` ends the run.
pub trait SpeedSource {
    /// Next sample, if the source has one.
    fn next_sample(&mut self) -> Option<SpeedSample>;
}

/// Receives the bounded throttle command each cycle.
pub trait ThrottleSink {
    /// Apply the command to the hardware.
    fn apply(&mut self, cmd: ThrottleCommand);
}

/// Receives mode changes, e.g. to drive a status LED.
pub trait StatusIndicator {
    /// Called once per mode change, not once per cycle.
    fn mode_changed(&mut self, mode: ControlMode);
}

/// A status indicator that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIndicator;

impl StatusIndicator for NullIndicator {
    fn mode_changed(&mut self, _mode: ControlMode) {}
}

/// Wires a source, the controller, a sink and an indicator into the fixed
/// per-tick sequence. Drains the source to exhaustion.
pub fn run_to_exhaustion<S, T, I>(
    controller: &mut CruiseController,
    source: &mut S,
    sink: &mut T,
    indicator: &mut I,
) -> Option<ControlOutput>
where
    S: SpeedSource,
    T: ThrottleSink,
    I: StatusIndicator,
{
    let mut last: Option<ControlOutput> = None;
    while let Some(sample) = source.next_sample() {
        let out = controller.cycle(sample);
        sink.apply(out.throttle);
        if last.map(|prev| prev.mode) != Some(out.mode) {
            debug!(mode = ?out.mode, "indicating mode");
            indicator.mode_changed(out.mode);
        }
        last = Some(out);
    }
    last
}
