//! Brake safety monitor.
//!
//! The brake is the only signal allowed to preempt every other component.
//! It has no debounce: the override must take effect within the same cycle
//! it is observed.

use kickcruise_config::CruiseConfig;

/// Stateless check of the raw sensor level against the brake threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrakeMonitor;

impl BrakeMonitor {
    /// Whether the raw sensor value asserts the brake override.
    #[inline]
    pub fn engaged(self, raw_sensor: u16, config: &CruiseConfig) -> bool {
        raw_sensor >= config.brake_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_released() {
        let config = CruiseConfig::default();
        assert!(!BrakeMonitor.engaged(0, &config));
        assert!(!BrakeMonitor.engaged(config.brake_threshold - 1, &config));
    }

    #[test]
    fn at_and_above_threshold_is_engaged() {
        let config = CruiseConfig::default();
        assert!(BrakeMonitor.engaged(config.brake_threshold, &config));
        assert!(BrakeMonitor.engaged(u16::MAX, &config));
    }
}
