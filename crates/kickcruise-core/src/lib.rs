//! Cruise-assist control core for electric kick-scooters.
//!
//! Reads the scooter's decoded speed signal, detects rider kicks, and drives
//! the throttle line to extend or hold speed after a qualifying kick
//! sequence, yielding unconditionally to the mechanical brake.
//!
//! # Overview
//!
//! The core fuses three real-time algorithms over a single noisy speed
//! signal:
//!
//! - **Kick detection** with a speed-dependent decaying threshold and
//!   debounce ([`kick`])
//! - **Target planning** turning kick sequences into a clamped, incrementally
//!   adjusted cruise target ([`planner`])
//! - **Dual-gain-schedule PID** converting the target into a bounded
//!   throttle duty ([`pid`])
//!
//! A state machine ([`controller`]) owns the mode and sequences the pieces;
//! the brake monitor ([`brake`]) preempts all of it within the same cycle.
//!
//! # Real-time guarantees
//!
//! - No heap allocations in the cycle path after construction
//! - O(1) work per cycle
//! - No clock reads: timestamps arrive with the samples
//! - No panics; malformed input is dropped, never propagated
//!
//! # Example
//!
//! ```
//! use kickcruise_config::CruiseConfig;
//! use kickcruise_core::prelude::*;
//!
//! let mut controller = CruiseController::new(CruiseConfig::default())?;
//!
//! // One cycle per sampling tick: 10 km/h, brake released.
//! let out = controller.cycle(SpeedSample::new(50_000_000, 10.0, 0));
//! assert_eq!(out.mode, ControlMode::Idle);
//! # Ok::<(), kickcruise_config::ConfigError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod brake;
pub mod controller;
pub mod history;
pub mod io;
pub mod kick;
pub mod pid;
pub mod planner;
pub mod prelude;
pub mod types;

pub use brake::BrakeMonitor;
pub use controller::CruiseController;
pub use history::SpeedHistory;
pub use io::{NullIndicator, SpeedSource, StatusIndicator, ThrottleSink, run_to_exhaustion};
pub use kick::{KickDetector, kick_threshold};
pub use pid::{DualGainPid, GainSchedule};
pub use planner::TargetPlanner;
pub use types::{ControlMode, ControlOutput, KickEvent, SpeedSample, ThrottleCommand};
