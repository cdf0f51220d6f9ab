//! Dual-gain-schedule PID control of throttle duty against speed error.
//!
//! Two independently tuned gain sets run at two sample periods: an
//! aggressive High schedule (default, short period) and a gentle Low
//! schedule for higher speeds. Schedule selection carries hysteresis so the
//! controller does not chatter at the crossover, and the integral term is
//! carried across switches unscaled to keep the output continuous.

use kickcruise_config::{CruiseConfig, PidGains, THROTTLE_MAX_DUTY};
use tracing::debug;

use crate::types::ThrottleCommand;

/// Which gain set is currently driving the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GainSchedule {
    /// Aggressive gains, shorter sample period.
    #[default]
    High,
    /// Gentle gains, longer sample period.
    Low,
}

/// PID state persisting across cycles.
///
/// Reset only when the controller leaves active throttling (idle or
/// braking); schedule switches deliberately keep the accumulator.
#[derive(Debug, Clone, Default)]
pub struct DualGainPid {
    integral: f32,
    prev_error: f32,
    last_update_ns: Option<u64>,
    schedule: GainSchedule,
    output_duty: f32,
}

impl DualGainPid {
    /// Create a controller at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// The schedule currently selected.
    #[inline]
    pub fn schedule(&self) -> GainSchedule {
        self.schedule
    }

    /// Open-loop duty estimate for holding a given speed: linear map of the
    /// speed band onto the legal duty range.
    pub fn duty_for_speed(speed_kmh: f32, config: &CruiseConfig) -> f32 {
        let span = f32::from(THROTTLE_MAX_DUTY) - f32::from(config.base_duty);
        let fraction = if config.max_speed_kmh > 0.0 {
            (speed_kmh / config.max_speed_kmh).clamp(0.0, 1.0)
        } else {
            0.0
        };
        f32::from(config.base_duty) + span * fraction
    }

    /// Seed the controller on entry into active throttling.
    ///
    /// Starts from a scaled open-loop estimate instead of zero so the first
    /// closed-loop cycles do not overshoot from cold.
    pub fn seed(&mut self, now_ns: u64, speed_kmh: f32, config: &CruiseConfig) {
        let estimate = Self::duty_for_speed(speed_kmh, config) * config.seed_limiter;
        let floor = f32::from(config.base_duty);
        self.integral = estimate.max(floor);
        self.prev_error = 0.0;
        self.last_update_ns = Some(now_ns);
        self.output_duty = self.integral;
        debug!(seed_duty = self.output_duty, "pid seeded");
    }

    /// Reset to rest; the next activation must seed again.
    pub fn reset(&mut self, config: &CruiseConfig) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_update_ns = None;
        self.schedule = GainSchedule::High;
        self.output_duty = f32::from(config.base_duty);
    }

    /// Run one control cycle toward `target_kmh` and return the clamped duty.
    ///
    /// Recomputes only when the active schedule's sample period has elapsed;
    /// between periods the previous output is held. Output is clamped to the
    /// legal duty range every cycle, and the integral stops accumulating in
    /// the direction of an active clamp (anti-windup).
    pub fn update(
        &mut self,
        now_ns: u64,
        target_kmh: f32,
        speed_kmh: f32,
        config: &CruiseConfig,
    ) -> ThrottleCommand {
        self.select_schedule(speed_kmh, config);
        let gains = self.active_gains(config);

        let Some(last) = self.last_update_ns else {
            // Not seeded; behave as if seeded this cycle.
            self.seed(now_ns, speed_kmh, config);
            return ThrottleCommand::clamped(self.output_duty, config);
        };

        let period_ns = u64::try_from(gains.period.as_nanos()).unwrap_or(u64::MAX);
        let elapsed_ns = now_ns.saturating_sub(last);
        if elapsed_ns < period_ns {
            return ThrottleCommand::clamped(self.output_duty, config);
        }

        #[allow(clippy::cast_precision_loss)]
        let dt = elapsed_ns as f32 / 1e9;
        let error = target_kmh - speed_kmh;

        let proportional = gains.kp * error;
        let derivative = if dt > 0.0 {
            gains.kd * (error - self.prev_error) / dt
        } else {
            0.0
        };

        let accumulated = self.integral + gains.ki * error * dt;
        let raw = proportional + accumulated + derivative;

        let min = f32::from(config.base_duty);
        let max = f32::from(THROTTLE_MAX_DUTY);
        // Anti-windup: while saturated, do not keep integrating into the clamp.
        let saturated_high = raw > max && error > 0.0;
        let saturated_low = raw < min && error < 0.0;
        if !saturated_high && !saturated_low {
            self.integral = accumulated;
        }

        self.output_duty = (proportional + self.integral + derivative).clamp(min, max);
        self.prev_error = error;
        self.last_update_ns = Some(now_ns);

        ThrottleCommand::clamped(self.output_duty, config)
    }

    fn select_schedule(&mut self, speed_kmh: f32, config: &CruiseConfig) {
        let crossover = config.min_increment_from_kmh;
        match self.schedule {
            GainSchedule::High => {
                if speed_kmh >= crossover {
                    self.schedule = GainSchedule::Low;
                    debug!(speed_kmh, "gain schedule: low");
                }
            }
            GainSchedule::Low => {
                // Hysteresis: the low schedule stays active until the speed
                // leaves the extended band.
                if speed_kmh < crossover - config.low_band_extend_kmh {
                    self.schedule = GainSchedule::High;
                    debug!(speed_kmh, "gain schedule: high");
                }
            }
        }
    }

    fn active_gains(&self, config: &CruiseConfig) -> PidGains {
        match self.schedule {
            GainSchedule::High => config.gains_high,
            GainSchedule::Low => config.gains_low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn seed_scales_open_loop_estimate() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 20.0, &config);
        let estimate = DualGainPid::duty_for_speed(20.0, &config) * config.seed_limiter;
        assert!((pid.output_duty - estimate.max(f32::from(config.base_duty))).abs() < 1e-3);
    }

    #[test]
    fn duty_for_speed_spans_the_range() {
        let config = CruiseConfig::default();
        assert!(
            (DualGainPid::duty_for_speed(0.0, &config) - f32::from(config.base_duty)).abs() < 1e-5
        );
        assert!(
            (DualGainPid::duty_for_speed(config.max_speed_kmh, &config)
                - f32::from(THROTTLE_MAX_DUTY))
            .abs()
                < 1e-5
        );
    }

    #[test]
    fn output_always_in_duty_range() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 10.0, &config);
        let mut now = 0;
        for i in 0..200 {
            now += 100 * MS;
            // Wild target/speed combinations must never escape the clamp.
            let target = if i % 2 == 0 { 25.0 } else { 5.0 };
            let speed = if i % 3 == 0 { 0.0 } else { 30.0 };
            let cmd = pid.update(now, target, speed, &config);
            assert!(cmd.duty >= config.base_duty);
            assert!(cmd.duty <= THROTTLE_MAX_DUTY);
        }
    }

    #[test]
    fn holds_output_between_sample_periods() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 10.0, &config);
        let first = pid.update(100 * MS, 15.0, 10.0, &config);
        // 50 ms later: inside the 100 ms high-schedule period.
        let held = pid.update(150 * MS, 15.0, 12.0, &config);
        assert_eq!(first, held);
    }

    #[test]
    fn positive_error_pushes_duty_up() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 10.0, &config);
        let seeded = pid.output_duty;
        let cmd = pid.update(100 * MS, 15.0, 10.0, &config);
        assert!(f32::from(cmd.duty) > seeded);
    }

    #[test]
    fn schedule_switches_low_at_crossover() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 10.0, &config);
        assert_eq!(pid.schedule(), GainSchedule::High);
        let _ = pid.update(100 * MS, 20.0, config.min_increment_from_kmh, &config);
        assert_eq!(pid.schedule(), GainSchedule::Low);
    }

    #[test]
    fn hysteresis_keeps_low_inside_band() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 10.0, &config);
        let _ = pid.update(100 * MS, 20.0, 18.5, &config);
        assert_eq!(pid.schedule(), GainSchedule::Low);
        // Just below the crossover but inside the extended band: stays low.
        let _ = pid.update(300 * MS, 20.0, 17.5, &config);
        assert_eq!(pid.schedule(), GainSchedule::Low);
        // Below the band: back to high.
        let _ = pid.update(500 * MS, 20.0, 16.5, &config);
        assert_eq!(pid.schedule(), GainSchedule::High);
    }

    #[test]
    fn integral_carries_across_schedule_switch() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 17.0, &config);
        let _ = pid.update(100 * MS, 19.0, 17.0, &config);
        let integral_before = pid.integral;
        // Crossing into the low schedule must not touch the accumulator.
        pid.select_schedule(18.5, &config);
        assert_eq!(pid.schedule(), GainSchedule::Low);
        assert!((pid.integral - integral_before).abs() < f32::EPSILON);
    }

    #[test]
    fn switch_does_not_jump_more_than_one_cycle_rate() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 17.0, &config);
        let mut now = 0;
        let mut speed = 17.0;
        let mut prev = pid.update(now + 100 * MS, 19.0, speed, &config);
        let mut max_step = 0i16;
        for i in 0..40 {
            now += 200 * MS;
            speed = 17.0 + (i % 5) as f32 * 0.5; // wanders across the crossover
            let cmd = pid.update(now, 19.0, speed, &config);
            let step = (i16::from(cmd.duty) - i16::from(prev.duty)).abs();
            max_step = max_step.max(step);
            prev = cmd;
        }
        // One cycle at the steady operating point never slews the full range.
        let full_range = i16::from(THROTTLE_MAX_DUTY) - i16::from(config.base_duty);
        assert!(max_step < full_range / 2, "max step {max_step}");
    }

    #[test]
    fn anti_windup_stops_accumulation_at_clamp() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 5.0, &config);
        let mut now = 0;
        // Large persistent error saturates the output high.
        for _ in 0..50 {
            now += 100 * MS;
            let cmd = pid.update(now, 25.0, 5.0, &config);
            assert_eq!(cmd.duty, THROTTLE_MAX_DUTY);
        }
        let wound = pid.integral;
        for _ in 0..50 {
            now += 100 * MS;
            let _ = pid.update(now, 25.0, 5.0, &config);
        }
        // The accumulator must not have grown while clamped.
        assert!(pid.integral <= wound + 1e-3);
    }

    #[test]
    fn recovers_promptly_after_saturation() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 5.0, &config);
        let mut now = 0;
        for _ in 0..50 {
            now += 100 * MS;
            let _ = pid.update(now, 25.0, 5.0, &config);
        }
        // Error flips: with a capped integral the output must leave the
        // rail within a few cycles instead of bleeding off a wound-up term.
        let mut left_rail_after = None;
        for i in 0..10 {
            now += 100 * MS;
            let cmd = pid.update(now, 5.0, 25.0, &config);
            if cmd.duty < THROTTLE_MAX_DUTY {
                left_rail_after = Some(i);
                break;
            }
        }
        assert!(matches!(left_rail_after, Some(i) if i <= 2));
    }

    #[test]
    fn reset_returns_to_floor() {
        let config = CruiseConfig::default();
        let mut pid = DualGainPid::new();
        pid.seed(0, 20.0, &config);
        pid.reset(&config);
        assert!((pid.output_duty - f32::from(config.base_duty)).abs() < 1e-5);
        assert_eq!(pid.schedule(), GainSchedule::High);
        assert!(pid.last_update_ns.is_none());
    }
}
