//! Core data types crossing the controller boundary.

use kickcruise_config::{CruiseConfig, THROTTLE_MAX_DUTY};
use serde::{Deserialize, Serialize};

/// One decoded speed reading, produced once per sampling tick.
///
/// Timestamps are monotonic nanoseconds from the external clock collaborator;
/// the core never reads a clock itself. `raw_sensor` is the undecoded sensor
/// level and is only consulted by the brake monitor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// Monotonic timestamp in nanoseconds.
    pub ts_mono_ns: u64,
    /// Decoded speed in km/h.
    pub speed_kmh: f32,
    /// Raw sensor value, compared against the brake threshold.
    pub raw_sensor: u16,
}

impl SpeedSample {
    /// Convenience constructor.
    pub fn new(ts_mono_ns: u64, speed_kmh: f32, raw_sensor: u16) -> Self {
        Self {
            ts_mono_ns,
            speed_kmh,
            raw_sensor,
        }
    }
}

/// A rider kick: an above-threshold speed jump accepted by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KickEvent {
    /// Timestamp of the sample that carried the jump.
    pub ts_mono_ns: u64,
    /// Speed at detection, km/h.
    pub speed_kmh: f32,
}

/// Bounded PWM duty handed to the throttle output collaborator.
///
/// Always within `[base_duty, THROTTLE_MAX_DUTY]`; the floor duty reads as
/// zero throttle request on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleCommand {
    /// PWM duty cycle value.
    pub duty: u8,
}

impl ThrottleCommand {
    /// The floor command for a given configuration: zero throttle request.
    pub fn floor(config: &CruiseConfig) -> Self {
        Self {
            duty: config.base_duty,
        }
    }

    /// Clamp an unbounded controller output into the legal duty range.
    pub fn clamped(raw: f32, config: &CruiseConfig) -> Self {
        let min = f32::from(config.base_duty);
        let max = f32::from(THROTTLE_MAX_DUTY);
        let bounded = if raw.is_finite() {
            raw.clamp(min, max)
        } else {
            min
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let duty = bounded.round() as u8;
        Self { duty }
    }
}

/// Controller mode, exported for the status indicator collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlMode {
    /// No assist; throttle held at the floor.
    #[default]
    Idle,
    /// First kick seen; counting kicks toward the boost quota.
    Armed,
    /// Driving toward a freshly raised target.
    Boost,
    /// Holding the last target.
    Cruise,
    /// Brake override active; throttle forced to the floor.
    Braking,
}

/// Everything the core produces in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// Clamped throttle duty for the output collaborator.
    pub throttle: ThrottleCommand,
    /// Current mode, for the status indicator.
    pub mode: ControlMode,
    /// The cruise target currently held, if any.
    pub target_kmh: Option<f32>,
    /// Whether a kick was accepted this cycle.
    pub kicked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_matches_base_duty() {
        let config = CruiseConfig::default();
        assert_eq!(ThrottleCommand::floor(&config).duty, config.base_duty);
    }

    #[test]
    fn clamp_bounds_both_sides() {
        let config = CruiseConfig::default();
        assert_eq!(ThrottleCommand::clamped(0.0, &config).duty, config.base_duty);
        assert_eq!(
            ThrottleCommand::clamped(1000.0, &config).duty,
            THROTTLE_MAX_DUTY
        );
    }

    #[test]
    fn clamp_passes_in_range_values() {
        let config = CruiseConfig::default();
        assert_eq!(ThrottleCommand::clamped(120.4, &config).duty, 120);
    }

    #[test]
    fn clamp_handles_non_finite() {
        let config = CruiseConfig::default();
        assert_eq!(
            ThrottleCommand::clamped(f32::NAN, &config).duty,
            config.base_duty
        );
        assert_eq!(
            ThrottleCommand::clamped(f32::INFINITY, &config).duty,
            config.base_duty
        );
    }

    #[test]
    fn default_mode_is_idle() {
        assert_eq!(ControlMode::default(), ControlMode::Idle);
    }
}
