//! Target speed planning: turning kick sequences into a clamped cruise
//! target, with catch-up forgetting across temporary speed drops.

use kickcruise_config::CruiseConfig;
use tracing::debug;

/// Owns the cruise target the PID tracks.
#[derive(Debug, Clone, Default)]
pub struct TargetPlanner {
    target_kmh: Option<f32>,
}

impl TargetPlanner {
    /// Create a planner with no target.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently held target, if any.
    #[inline]
    pub fn target(&self) -> Option<f32> {
        self.target_kmh
    }

    /// Raise the target for a fresh boost and return the new value.
    ///
    /// Bases on the held target when one exists, otherwise on the current
    /// speed. The increment is the configured default, lifted to the minimum
    /// increment once the rider is already at speed, where proportionally
    /// small throttle changes are barely felt. The result is clamped to the
    /// configured speed band.
    pub fn boost(&mut self, current_speed_kmh: f32, config: &CruiseConfig) -> f32 {
        let base = self.target_kmh.unwrap_or(current_speed_kmh);
        let mut increment = config.kick_increment_kmh;
        if current_speed_kmh >= config.min_increment_from_kmh {
            increment = increment.max(config.min_increment_kmh);
        }
        let target = (base + increment).clamp(config.min_speed_kmh, config.max_speed_kmh);
        debug!(target_kmh = target, base_kmh = base, "target raised");
        self.target_kmh = Some(target);
        target
    }

    /// Per-cycle upkeep while cruising.
    ///
    /// A remembered target survives a temporary drop (uphill, headwind) and
    /// is re-pursued; once the drop exceeds `forget_drop_kmh` the target is
    /// stale and re-based onto the current speed instead of being chased
    /// indefinitely.
    pub fn maintain(&mut self, current_speed_kmh: f32, config: &CruiseConfig) {
        if let Some(target) = self.target_kmh
            && target - current_speed_kmh > config.forget_drop_kmh
        {
            let rebased =
                current_speed_kmh.clamp(config.min_speed_kmh, config.max_speed_kmh);
            debug!(
                stale_kmh = target,
                rebased_kmh = rebased,
                "catch-up target forgotten"
            );
            self.target_kmh = Some(rebased);
        }
    }

    /// Drop the held target.
    pub fn clear(&mut self) {
        self.target_kmh = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_boost_bases_on_current_speed() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        let target = planner.boost(10.0, &config);
        assert!((target - 13.0).abs() < 1e-5);
    }

    #[test]
    fn repeated_boosts_stack_on_the_target() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        planner.boost(10.0, &config);
        let target = planner.boost(11.0, &config);
        // Second boost bases on the held 13.0 target, not on current speed.
        assert!((target - 16.0).abs() < 1e-5);
    }

    #[test]
    fn minimum_increment_kicks_in_at_speed() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        // 18 km/h is at the enforcement speed; increment must be >= 5.
        let target = planner.boost(18.0, &config);
        assert!((target - 23.0).abs() < 1e-5);
    }

    #[test]
    fn target_clamped_to_max() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        for _ in 0..10 {
            planner.boost(24.0, &config);
        }
        let target = planner.target().unwrap_or(0.0);
        assert!((target - config.max_speed_kmh).abs() < 1e-5);
    }

    #[test]
    fn target_clamped_to_min() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        let target = planner.boost(0.5, &config);
        assert!(target >= config.min_speed_kmh);
    }

    #[test]
    fn small_drop_keeps_catch_up_target() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        planner.boost(20.0, &config);
        let held = planner.target().unwrap_or(0.0);
        // Drop of 8 km/h is within forget_drop_kmh = 10.
        planner.maintain(held - 8.0, &config);
        assert!((planner.target().unwrap_or(0.0) - held).abs() < 1e-5);
    }

    #[test]
    fn deep_drop_forgets_and_rebases() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        planner.boost(20.0, &config);
        let held = planner.target().unwrap_or(0.0);
        let slow = held - config.forget_drop_kmh - 1.0;
        planner.maintain(slow, &config);
        assert!((planner.target().unwrap_or(0.0) - slow).abs() < 1e-5);
    }

    #[test]
    fn maintain_without_target_is_a_no_op() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        planner.maintain(10.0, &config);
        assert!(planner.target().is_none());
    }

    #[test]
    fn clear_drops_target() {
        let config = CruiseConfig::default();
        let mut planner = TargetPlanner::new();
        planner.boost(10.0, &config);
        planner.clear();
        assert!(planner.target().is_none());
    }
}
