//! Ride scripting: deterministic speed sample sequences.

use kickcruise_core::SpeedSample;

/// Raw sensor level used for "brake pulled" segments; matches the stock
/// default trigger level.
pub const BRAKE_RAW: u16 = 47;

/// Builds a monotonic sequence of [`SpeedSample`]s one segment at a time.
///
/// Every call appends samples spaced by the tick period; timestamps start at
/// zero and only move forward, so rides replay deterministically through the
/// controller.
#[derive(Debug, Clone)]
pub struct Ride {
    tick_ns: u64,
    next_ts_ns: u64,
    samples: Vec<SpeedSample>,
}

impl Ride {
    /// Start a ride sampled every `tick_ms` milliseconds.
    pub fn at_tick_ms(tick_ms: u64) -> Self {
        Self {
            tick_ns: tick_ms.max(1) * 1_000_000,
            next_ts_ns: 0,
            samples: Vec::new(),
        }
    }

    fn push(&mut self, speed_kmh: f32, raw_sensor: u16) {
        self.samples
            .push(SpeedSample::new(self.next_ts_ns, speed_kmh, raw_sensor));
        self.next_ts_ns += self.tick_ns;
    }

    /// Hold a speed for `ticks` samples.
    #[must_use]
    pub fn steady(mut self, speed_kmh: f32, ticks: usize) -> Self {
        for _ in 0..ticks {
            self.push(speed_kmh, 0);
        }
        self
    }

    /// A rider kick: one sample jumping straight to `speed_kmh`.
    #[must_use]
    pub fn kick_to(mut self, speed_kmh: f32) -> Self {
        self.push(speed_kmh, 0);
        self
    }

    /// Ramp linearly to `speed_kmh` over `ticks` samples.
    #[must_use]
    pub fn ramp_to(mut self, speed_kmh: f32, ticks: usize) -> Self {
        let ticks = ticks.max(1);
        let from = self
            .samples
            .last()
            .map(|s| s.speed_kmh)
            .unwrap_or(0.0);
        #[allow(clippy::cast_precision_loss)]
        let step = (speed_kmh - from) / ticks as f32;
        for i in 1..=ticks {
            #[allow(clippy::cast_precision_loss)]
            self.push(from + step * i as f32, 0);
        }
        self
    }

    /// Pull the brake for `ticks` samples while coasting down to
    /// `end_speed_kmh`.
    #[must_use]
    pub fn brake(mut self, end_speed_kmh: f32, ticks: usize) -> Self {
        let ticks = ticks.max(1);
        let from = self
            .samples
            .last()
            .map(|s| s.speed_kmh)
            .unwrap_or(end_speed_kmh);
        #[allow(clippy::cast_precision_loss)]
        let step = (end_speed_kmh - from) / ticks as f32;
        for i in 1..=ticks {
            #[allow(clippy::cast_precision_loss)]
            self.push(from + step * i as f32, BRAKE_RAW);
        }
        self
    }

    /// Inject a single raw sample verbatim (e.g. a sensor glitch). The
    /// timestamp cursor still advances one tick.
    #[must_use]
    pub fn glitch(mut self, speed_kmh: f32) -> Self {
        self.push(speed_kmh, 0);
        self
    }

    /// Wait `ticks` samples at the last seen speed.
    #[must_use]
    pub fn coast(self, ticks: usize) -> Self {
        let speed = self.samples.last().map(|s| s.speed_kmh).unwrap_or(0.0);
        self.steady(speed, ticks)
    }

    /// Finish the script and hand out the samples.
    #[must_use]
    pub fn samples(self) -> Vec<SpeedSample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_strictly_monotonic() {
        let ride = Ride::at_tick_ms(50)
            .steady(10.0, 5)
            .kick_to(14.0)
            .brake(5.0, 4)
            .coast(3)
            .samples();
        for pair in ride.windows(2) {
            assert!(pair[1].ts_mono_ns > pair[0].ts_mono_ns);
        }
    }

    #[test]
    fn brake_segments_carry_the_trigger_level() {
        let ride = Ride::at_tick_ms(50).steady(10.0, 2).brake(5.0, 3).samples();
        assert!(ride.iter().skip(2).all(|s| s.raw_sensor == BRAKE_RAW));
    }

    #[test]
    fn ramp_reaches_the_target() {
        let ride = Ride::at_tick_ms(50).steady(5.0, 1).ramp_to(15.0, 10).samples();
        let last = ride.last().map(|s| s.speed_kmh).unwrap_or(0.0);
        assert!((last - 15.0).abs() < 1e-4);
    }
}
