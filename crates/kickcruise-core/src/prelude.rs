//! Convenience re-exports for controller users.

pub use crate::brake::BrakeMonitor;
pub use crate::controller::CruiseController;
pub use crate::history::SpeedHistory;
pub use crate::io::{NullIndicator, SpeedSource, StatusIndicator, ThrottleSink, run_to_exhaustion};
pub use crate::kick::{KickDetector, kick_threshold};
pub use crate::pid::{DualGainPid, GainSchedule};
pub use crate::planner::TargetPlanner;
pub use crate::types::{
    ControlMode, ControlOutput, KickEvent, SpeedSample, ThrottleCommand,
};
