//! The control state machine: single writer of the mode, orchestrates the
//! detector, planner and PID, and applies the brake override.

use kickcruise_config::{CruiseConfig, ConfigResult, MAX_PLAUSIBLE_SPEED_KMH};
use tracing::{debug, warn};

use crate::brake::BrakeMonitor;
use crate::history::SpeedHistory;
use crate::kick::KickDetector;
use crate::pid::DualGainPid;
use crate::planner::TargetPlanner;
use crate::types::{ControlMode, ControlOutput, SpeedSample, ThrottleCommand};

/// Why a sample was dropped without mutating any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleRejection {
    NonMonotonicTimestamp,
    NonFiniteSpeed,
    ImplausibleSpeed,
}

/// The cruise-assist controller.
///
/// Owns every piece of mutable state in the core and advances it one
/// [`cycle`](Self::cycle) per speed sample. Single-threaded by design; all
/// timers are elapsed-time comparisons on the sample timestamps, so replayed
/// sequences behave deterministically.
#[derive(Debug)]
pub struct CruiseController {
    config: CruiseConfig,
    history: SpeedHistory,
    detector: KickDetector,
    brake: BrakeMonitor,
    planner: TargetPlanner,
    pid: DualGainPid,

    mode: ControlMode,
    kick_count: u8,
    window_start_ns: u64,
    mode_entered_ns: u64,
    armed_from_cruise: bool,
    last_ts_ns: Option<u64>,
    last_output: ControlOutput,
    rejected_samples: u32,
}

impl CruiseController {
    /// Build a controller from a configuration, validating it first.
    ///
    /// # Errors
    ///
    /// Returns the configuration error verbatim; a controller is never
    /// constructed from an invalid configuration, so failing here fails safe
    /// at zero throttle.
    pub fn new(config: CruiseConfig) -> ConfigResult<Self> {
        config.validate()?;
        let floor = ThrottleCommand::floor(&config);
        let history = SpeedHistory::new(config.history_len);
        Ok(Self {
            config,
            history,
            detector: KickDetector::new(),
            brake: BrakeMonitor,
            planner: TargetPlanner::new(),
            pid: DualGainPid::new(),
            mode: ControlMode::Idle,
            kick_count: 0,
            window_start_ns: 0,
            mode_entered_ns: 0,
            armed_from_cruise: false,
            last_ts_ns: None,
            last_output: ControlOutput {
                throttle: floor,
                mode: ControlMode::Idle,
                target_kmh: None,
                kicked: false,
            },
            rejected_samples: 0,
        })
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// The cruise target currently held, if any.
    #[inline]
    pub fn target_kmh(&self) -> Option<f32> {
        self.planner.target()
    }

    /// The configuration the controller was built with.
    #[inline]
    pub fn config(&self) -> &CruiseConfig {
        &self.config
    }

    /// Count of samples dropped as input anomalies since construction.
    #[inline]
    pub fn rejected_samples(&self) -> u32 {
        self.rejected_samples
    }

    /// Advance one control cycle.
    ///
    /// Runs the fixed per-cycle sequence: input validation, brake check,
    /// history update, kick detection, state machine step, target upkeep,
    /// PID compute, output clamp. Malformed samples are dropped and the
    /// previous output re-issued, never mutating state.
    pub fn cycle(&mut self, sample: SpeedSample) -> ControlOutput {
        if let Err(rejection) = self.admit(&sample) {
            warn!(?rejection, ts = sample.ts_mono_ns, "sample dropped");
            self.rejected_samples = self.rejected_samples.saturating_add(1);
            return self.last_output;
        }
        let now = sample.ts_mono_ns;
        self.last_ts_ns = Some(now);

        // The brake wins over everything, within the cycle it is observed.
        if self.brake.engaged(sample.raw_sensor, &self.config) {
            self.history.push(sample);
            return self.enter_braking(now);
        }
        if self.mode == ControlMode::Braking {
            self.transition(ControlMode::Idle, now);
        }

        self.history.push(sample);
        let kick = self
            .detector
            .update(&sample, &self.config)
            // No assist while pushing the scooter around below launch speed.
            .filter(|k| k.speed_kmh >= self.config.launch_speed_kmh);
        let kicked = kick.is_some();

        let speed = sample.speed_kmh;
        match self.mode {
            ControlMode::Idle => {
                if kicked {
                    self.arm(now, false);
                    self.try_boost(now, speed);
                }
            }
            ControlMode::Armed => {
                // Quota must be met strictly within the window; expiry is
                // checked before this cycle's kick is counted.
                if self.elapsed(self.window_start_ns, now) >= self.config.kick_window {
                    let fallback = if self.armed_from_cruise && self.planner.target().is_some() {
                        ControlMode::Cruise
                    } else {
                        self.planner.clear();
                        ControlMode::Idle
                    };
                    let from_cruise = fallback == ControlMode::Cruise;
                    self.transition(fallback, now);
                    if kicked {
                        // A late kick opens a fresh window instead.
                        self.arm(now, from_cruise);
                        self.try_boost(now, speed);
                    }
                } else if kicked {
                    self.kick_count = self.kick_count.saturating_add(1);
                    if self.kick_count >= self.config.kicks_to_boost {
                        self.enter_boost(now, speed);
                    }
                }
            }
            ControlMode::Boost => {
                if self.kick_count > 0
                    && self.elapsed(self.window_start_ns, now) >= self.config.boost_kick_window
                {
                    self.kick_count = 0;
                }
                if kicked {
                    if self.kick_count == 0 {
                        self.window_start_ns = now;
                    }
                    self.kick_count = self.kick_count.saturating_add(1);
                    if self.kick_count >= self.config.kicks_to_boost {
                        // Re-boost: raise the target again, restart the timer.
                        self.enter_boost(now, speed);
                    }
                }
                if self.elapsed(self.mode_entered_ns, now) >= self.config.boost_duration {
                    self.transition(ControlMode::Cruise, now);
                }
            }
            ControlMode::Cruise => {
                self.planner.maintain(speed, &self.config);
                if kicked {
                    self.arm(now, true);
                    self.try_boost(now, speed);
                } else if self.history.average() < self.config.min_speed_kmh {
                    // Sustained slowdown below the band: stand down.
                    self.planner.clear();
                    self.pid.reset(&self.config);
                    self.transition(ControlMode::Idle, now);
                }
            }
            ControlMode::Braking => {
                // Unreachable: handled before the match. Kept total.
            }
        }

        let throttle = match self.planner.target() {
            Some(target)
                if matches!(
                    self.mode,
                    ControlMode::Boost | ControlMode::Cruise | ControlMode::Armed
                ) =>
            {
                self.pid.update(now, target, speed, &self.config)
            }
            _ => ThrottleCommand::floor(&self.config),
        };

        self.last_output = ControlOutput {
            throttle,
            mode: self.mode,
            target_kmh: self.planner.target(),
            kicked,
        };
        self.last_output
    }

    fn admit(&self, sample: &SpeedSample) -> Result<(), SampleRejection> {
        if !sample.speed_kmh.is_finite() {
            return Err(SampleRejection::NonFiniteSpeed);
        }
        if sample.speed_kmh < 0.0 || sample.speed_kmh > MAX_PLAUSIBLE_SPEED_KMH {
            return Err(SampleRejection::ImplausibleSpeed);
        }
        if let Some(last) = self.last_ts_ns
            && sample.ts_mono_ns <= last
        {
            return Err(SampleRejection::NonMonotonicTimestamp);
        }
        Ok(())
    }

    fn enter_braking(&mut self, now: u64) -> ControlOutput {
        if self.mode != ControlMode::Braking {
            // Rider intervention invalidates the plan: drop target, reset PID.
            self.planner.clear();
            self.pid.reset(&self.config);
            self.detector.reset();
            self.kick_count = 0;
            self.transition(ControlMode::Braking, now);
        }
        self.last_output = ControlOutput {
            throttle: ThrottleCommand::floor(&self.config),
            mode: ControlMode::Braking,
            target_kmh: None,
            kicked: false,
        };
        self.last_output
    }

    fn arm(&mut self, now: u64, from_cruise: bool) {
        self.kick_count = 1;
        self.window_start_ns = now;
        self.armed_from_cruise = from_cruise;
        self.transition(ControlMode::Armed, now);
    }

    fn try_boost(&mut self, now: u64, speed: f32) {
        if self.kick_count >= self.config.kicks_to_boost {
            self.enter_boost(now, speed);
        }
    }

    fn enter_boost(&mut self, now: u64, speed: f32) {
        let was_active = self.planner.target().is_some();
        let target = self.planner.boost(speed, &self.config);
        if !was_active {
            self.pid.seed(now, speed, &self.config);
        }
        self.kick_count = 0;
        self.window_start_ns = now;
        self.transition(ControlMode::Boost, now);
        // A re-boost keeps the mode but must still restart the boost clock.
        self.mode_entered_ns = now;
        debug!(target_kmh = target, "boosting");
    }

    fn transition(&mut self, next: ControlMode, now: u64) {
        if self.mode != next {
            debug!(from = ?self.mode, to = ?next, "mode transition");
            self.mode = next;
            self.mode_entered_ns = now;
        }
    }

    fn elapsed(&self, since_ns: u64, now_ns: u64) -> std::time::Duration {
        std::time::Duration::from_nanos(now_ns.saturating_sub(since_ns))
    }
}
