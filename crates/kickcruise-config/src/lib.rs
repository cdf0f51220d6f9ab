//! Validated tuning configuration for the KickCruise control core.
//!
//! All tunables live in a single immutable [`CruiseConfig`] value that is
//! validated once at startup and then shared by reference with every
//! component of the control core. Parameters outside sane physical ranges
//! (for example a minimum speed above the maximum speed) are rejected at
//! load time, before the controller can enter active throttling.
//!
//! # Example
//!
//! ```
//! use kickcruise_config::CruiseConfig;
//!
//! let config = CruiseConfig::builder()
//!     .max_speed_kmh(22.0)
//!     .kicks_to_boost(2)
//!     .build()?;
//! assert!(config.kick_window > config.kick_debounce);
//! # Ok::<(), kickcruise_config::ConfigError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hardware maximum PWM duty the motor controller accepts as full throttle.
pub const THROTTLE_MAX_DUTY: u8 = 233;

/// Speeds above this are treated as sensor glitches and dropped.
pub const MAX_PLAUSIBLE_SPEED_KMH: f32 = 100.0;

/// Configuration validation errors. All of these are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A speed bound or speed-valued parameter is contradictory.
    #[error("invalid speed bounds: {0}")]
    InvalidSpeedBounds(String),

    /// A duration parameter is zero or otherwise unusable.
    #[error("invalid duration for {name}: {value:?}")]
    InvalidDuration {
        /// Parameter name as it appears in the configuration.
        name: &'static str,
        /// The rejected value.
        value: Duration,
    },

    /// A scalar parameter is outside its allowed range.
    #[error("{name} out of range: {value} (allowed: {allowed})")]
    OutOfRange {
        /// Parameter name as it appears in the configuration.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable description of the allowed range.
        allowed: &'static str,
    },
}

/// A specialized `Result` for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// One PID gain schedule: gains plus the sample period they were tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain, per second.
    pub ki: f32,
    /// Derivative gain, in seconds.
    pub kd: f32,
    /// Sample period the schedule recomputes at.
    pub period: Duration,
}

impl PidGains {
    /// Aggressive schedule used at lower speeds (stock tuning).
    pub fn high() -> Self {
        Self {
            kp: 25.0,
            ki: 25.0,
            kd: 1.0,
            period: Duration::from_millis(100),
        }
    }

    /// Gentle schedule used at higher speeds (stock tuning).
    pub fn low() -> Self {
        Self {
            kp: 2.0,
            ki: 25.0,
            kd: 0.0,
            period: Duration::from_millis(200),
        }
    }

    fn validate(&self, name: &'static str) -> ConfigResult<()> {
        for value in [self.kp, self.ki, self.kd] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    allowed: "finite and non-negative gains",
                });
            }
        }
        if self.period.is_zero() {
            return Err(ConfigError::InvalidDuration {
                name,
                value: self.period,
            });
        }
        Ok(())
    }
}

/// Immutable tuning parameters for the cruise-assist controller.
///
/// Field defaults match the stock road tuning. Construct via
/// [`CruiseConfig::builder`] or deserialize and call
/// [`CruiseConfig::validate`] before handing the value to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruiseConfig {
    /// How long a boost lasts before the controller settles into cruise.
    pub boost_duration: Duration,
    /// Window, starting at the first kick, in which the kick quota must be met.
    pub kick_window: Duration,
    /// Re-kick window while already boosting.
    pub boost_kick_window: Duration,
    /// Minimum spacing between two accepted kicks.
    pub kick_debounce: Duration,

    /// Base speed jump (km/h) that registers as a kick at standstill.
    pub kick_threshold: f32,
    /// Multiplicative per-km/h decay of the kick threshold. Kicking harder
    /// at speed is physically harder, so the bar drops as speed rises.
    pub kick_threshold_decay: f32,
    /// Number of kicks inside the window required to enter boost.
    pub kicks_to_boost: u8,

    /// Drop below the held target (km/h) beyond which the target is forgotten
    /// instead of being chased.
    pub forget_drop_kmh: f32,
    /// Speed from which the minimum increment is enforced. Doubles as the
    /// crossover between the two PID gain schedules.
    pub min_increment_from_kmh: f32,
    /// Minimum per-boost target increment (km/h) at or above the enforcement
    /// speed.
    pub min_increment_kmh: f32,
    /// Default per-boost target increment (km/h).
    pub kick_increment_kmh: f32,

    /// Minimum speed (km/h) before the controller will assist at all.
    pub launch_speed_kmh: f32,
    /// Lower clamp for the cruise target; cruising below this drops to idle.
    pub min_speed_kmh: f32,
    /// Upper clamp for the cruise target.
    pub max_speed_kmh: f32,

    /// Floor duty: the PWM level the motor controller reads as zero throttle.
    pub base_duty: u8,
    /// Scale (0, 1] applied to the open-loop duty estimate that seeds the PID
    /// on entering active control; keeps the first closed-loop cycles from
    /// overshooting.
    pub seed_limiter: f32,

    /// Aggressive gain schedule, active below the crossover.
    pub gains_high: PidGains,
    /// Gentle gain schedule, active above the crossover.
    pub gains_low: PidGains,
    /// Hysteresis band (km/h) the low schedule stays active below the
    /// crossover, so the scheduler does not chatter at the boundary.
    pub low_band_extend_kmh: f32,

    /// Capacity of the speed history ring buffer.
    pub history_len: usize,
    /// Raw sensor level at or above which the brake override asserts.
    pub brake_threshold: u16,
}

impl Default for CruiseConfig {
    fn default() -> Self {
        Self {
            boost_duration: Duration::from_millis(5000),
            kick_window: Duration::from_millis(2000),
            boost_kick_window: Duration::from_millis(2000),
            kick_debounce: Duration::from_millis(300),
            kick_threshold: 3.0,
            kick_threshold_decay: 0.9872,
            kicks_to_boost: 1,
            forget_drop_kmh: 10.0,
            min_increment_from_kmh: 18.0,
            min_increment_kmh: 5.0,
            kick_increment_kmh: 3.0,
            launch_speed_kmh: 5.0,
            min_speed_kmh: 5.0,
            max_speed_kmh: 25.0,
            base_duty: 45,
            seed_limiter: 0.75,
            gains_high: PidGains::high(),
            gains_low: PidGains::low(),
            low_band_extend_kmh: 1.0,
            history_len: 20,
            brake_threshold: 47,
        }
    }
}

impl CruiseConfig {
    /// Create a configuration builder pre-loaded with the stock tuning.
    #[must_use]
    pub fn builder() -> CruiseConfigBuilder {
        CruiseConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered. A controller must not
    /// be constructed from a configuration that fails validation.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("boost_duration", self.boost_duration),
            ("kick_window", self.kick_window),
            ("boost_kick_window", self.boost_kick_window),
            ("kick_debounce", self.kick_debounce),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        if self.kick_debounce >= self.kick_window {
            return Err(ConfigError::InvalidSpeedBounds(format!(
                "kick_debounce {:?} must be shorter than kick_window {:?}",
                self.kick_debounce, self.kick_window
            )));
        }

        if self.min_speed_kmh > self.max_speed_kmh {
            return Err(ConfigError::InvalidSpeedBounds(format!(
                "min_speed_kmh {} above max_speed_kmh {}",
                self.min_speed_kmh, self.max_speed_kmh
            )));
        }
        if self.launch_speed_kmh > self.max_speed_kmh {
            return Err(ConfigError::InvalidSpeedBounds(format!(
                "launch_speed_kmh {} above max_speed_kmh {}",
                self.launch_speed_kmh, self.max_speed_kmh
            )));
        }
        if self.max_speed_kmh > MAX_PLAUSIBLE_SPEED_KMH {
            return Err(ConfigError::OutOfRange {
                name: "max_speed_kmh",
                value: self.max_speed_kmh,
                allowed: "at most the plausible sensor range",
            });
        }

        for (name, value) in [
            ("min_speed_kmh", self.min_speed_kmh),
            ("launch_speed_kmh", self.launch_speed_kmh),
            ("max_speed_kmh", self.max_speed_kmh),
            ("min_increment_from_kmh", self.min_increment_from_kmh),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    allowed: "finite and non-negative",
                });
            }
        }
        for (name, value) in [
            ("kick_threshold", self.kick_threshold),
            ("kick_increment_kmh", self.kick_increment_kmh),
            ("min_increment_kmh", self.min_increment_kmh),
            ("forget_drop_kmh", self.forget_drop_kmh),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    allowed: "finite and positive",
                });
            }
        }
        if !self.low_band_extend_kmh.is_finite() || self.low_band_extend_kmh < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "low_band_extend_kmh",
                value: self.low_band_extend_kmh,
                allowed: "finite and non-negative",
            });
        }
        if !(self.kick_threshold_decay > 0.0 && self.kick_threshold_decay <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "kick_threshold_decay",
                value: self.kick_threshold_decay,
                allowed: "(0, 1]",
            });
        }
        if !(self.seed_limiter > 0.0 && self.seed_limiter <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "seed_limiter",
                value: self.seed_limiter,
                allowed: "(0, 1]",
            });
        }

        if self.kicks_to_boost == 0 {
            return Err(ConfigError::OutOfRange {
                name: "kicks_to_boost",
                value: 0.0,
                allowed: "at least 1",
            });
        }
        if self.history_len == 0 {
            return Err(ConfigError::OutOfRange {
                name: "history_len",
                value: 0.0,
                allowed: "at least 1",
            });
        }
        if self.base_duty >= THROTTLE_MAX_DUTY {
            return Err(ConfigError::OutOfRange {
                name: "base_duty",
                value: f32::from(self.base_duty),
                allowed: "below the hardware maximum duty",
            });
        }

        self.gains_high.validate("gains_high")?;
        self.gains_low.validate("gains_low")?;
        Ok(())
    }
}

/// Builder for [`CruiseConfig`]. Starts from the stock tuning; `build`
/// validates the result.
#[derive(Debug, Default)]
pub struct CruiseConfigBuilder {
    config: CruiseConfig,
}

impl CruiseConfigBuilder {
    /// Set how long a boost lasts.
    #[must_use]
    pub fn boost_duration(mut self, d: Duration) -> Self {
        self.config.boost_duration = d;
        self
    }

    /// Set the kick quota window.
    #[must_use]
    pub fn kick_window(mut self, d: Duration) -> Self {
        self.config.kick_window = d;
        self
    }

    /// Set the re-kick window used while boosting.
    #[must_use]
    pub fn boost_kick_window(mut self, d: Duration) -> Self {
        self.config.boost_kick_window = d;
        self
    }

    /// Set the minimum spacing between accepted kicks.
    #[must_use]
    pub fn kick_debounce(mut self, d: Duration) -> Self {
        self.config.kick_debounce = d;
        self
    }

    /// Set the base kick threshold in km/h.
    #[must_use]
    pub fn kick_threshold(mut self, kmh: f32) -> Self {
        self.config.kick_threshold = kmh;
        self
    }

    /// Set the per-km/h threshold decay factor.
    #[must_use]
    pub fn kick_threshold_decay(mut self, decay: f32) -> Self {
        self.config.kick_threshold_decay = decay;
        self
    }

    /// Set the number of kicks required to enter boost.
    #[must_use]
    pub fn kicks_to_boost(mut self, kicks: u8) -> Self {
        self.config.kicks_to_boost = kicks;
        self
    }

    /// Set the drop beyond which a held target is forgotten.
    #[must_use]
    pub fn forget_drop_kmh(mut self, kmh: f32) -> Self {
        self.config.forget_drop_kmh = kmh;
        self
    }

    /// Set the speed from which the minimum increment is enforced.
    #[must_use]
    pub fn min_increment_from_kmh(mut self, kmh: f32) -> Self {
        self.config.min_increment_from_kmh = kmh;
        self
    }

    /// Set the minimum per-boost increment.
    #[must_use]
    pub fn min_increment_kmh(mut self, kmh: f32) -> Self {
        self.config.min_increment_kmh = kmh;
        self
    }

    /// Set the default per-boost increment.
    #[must_use]
    pub fn kick_increment_kmh(mut self, kmh: f32) -> Self {
        self.config.kick_increment_kmh = kmh;
        self
    }

    /// Set the minimum speed before the controller assists.
    #[must_use]
    pub fn launch_speed_kmh(mut self, kmh: f32) -> Self {
        self.config.launch_speed_kmh = kmh;
        self
    }

    /// Set the lower target clamp.
    #[must_use]
    pub fn min_speed_kmh(mut self, kmh: f32) -> Self {
        self.config.min_speed_kmh = kmh;
        self
    }

    /// Set the upper target clamp.
    #[must_use]
    pub fn max_speed_kmh(mut self, kmh: f32) -> Self {
        self.config.max_speed_kmh = kmh;
        self
    }

    /// Set the floor duty.
    #[must_use]
    pub fn base_duty(mut self, duty: u8) -> Self {
        self.config.base_duty = duty;
        self
    }

    /// Set the open-loop seed limiter.
    #[must_use]
    pub fn seed_limiter(mut self, scale: f32) -> Self {
        self.config.seed_limiter = scale;
        self
    }

    /// Set the aggressive gain schedule.
    #[must_use]
    pub fn gains_high(mut self, gains: PidGains) -> Self {
        self.config.gains_high = gains;
        self
    }

    /// Set the gentle gain schedule.
    #[must_use]
    pub fn gains_low(mut self, gains: PidGains) -> Self {
        self.config.gains_low = gains;
        self
    }

    /// Set the low-schedule hysteresis band.
    #[must_use]
    pub fn low_band_extend_kmh(mut self, kmh: f32) -> Self {
        self.config.low_band_extend_kmh = kmh;
        self
    }

    /// Set the speed history capacity.
    #[must_use]
    pub fn history_len(mut self, len: usize) -> Self {
        self.config.history_len = len;
        self
    }

    /// Set the raw brake trigger level.
    #[must_use]
    pub fn brake_threshold(mut self, raw: u16) -> Self {
        self.config.brake_threshold = raw;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the assembled configuration is invalid.
    pub fn build(self) -> ConfigResult<CruiseConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
