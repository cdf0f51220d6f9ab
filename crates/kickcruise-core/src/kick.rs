//! Kick detection: telling rider pushes apart from noise and from the
//! controller's own throttle-induced acceleration.

use kickcruise_config::CruiseConfig;

use crate::types::{KickEvent, SpeedSample};

/// Active kick threshold at a given speed, in km/h of delta per tick.
///
/// The base threshold decays multiplicatively with speed: kicking hard
/// enough to jump 3 km/h at 20 km/h is physically harder than at walking
/// pace, so the bar drops as speed rises. Monotonically non-increasing in
/// speed for any decay in `(0, 1]`.
#[inline]
pub fn kick_threshold(speed_kmh: f32, config: &CruiseConfig) -> f32 {
    config.kick_threshold * config.kick_threshold_decay.powf(speed_kmh.max(0.0))
}

/// Stateful kick detector.
///
/// Compares each sample against its predecessor and emits a [`KickEvent`]
/// when the speed delta clears the speed-dependent threshold and the
/// debounce interval has elapsed. The very first sample has no predecessor
/// and can never trigger.
#[derive(Debug, Clone, Default)]
pub struct KickDetector {
    prev: Option<SpeedSample>,
    last_kick_ns: Option<u64>,
}

impl KickDetector {
    /// Create a detector with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next sample; returns the kick it carried, if any.
    ///
    /// The caller guarantees monotonically increasing timestamps; samples
    /// failing that contract are rejected upstream and never reach the
    /// detector.
    pub fn update(&mut self, sample: &SpeedSample, config: &CruiseConfig) -> Option<KickEvent> {
        let prev = self.prev.replace(*sample);
        let prev = prev?;

        let delta = sample.speed_kmh - prev.speed_kmh;
        let threshold = kick_threshold(sample.speed_kmh, config);
        if delta < threshold {
            return None;
        }

        // Debounce: two pushes cannot land closer than kick_debounce.
        let debounce_ns = u64::try_from(config.kick_debounce.as_nanos()).unwrap_or(u64::MAX);
        if let Some(last) = self.last_kick_ns
            && sample.ts_mono_ns.saturating_sub(last) < debounce_ns
        {
            return None;
        }

        self.last_kick_ns = Some(sample.ts_mono_ns);
        Some(KickEvent {
            ts_mono_ns: sample.ts_mono_ns,
            speed_kmh: sample.speed_kmh,
        })
    }

    /// Forget the previous sample and debounce state.
    pub fn reset(&mut self) {
        self.prev = None;
        self.last_kick_ns = None;
    }
}
