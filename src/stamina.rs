//! Stamina gate.
//!
//! Sprinting drains a stamina pool. Running it dry exhausts the actor, and
//! exhaustion only clears once the pool has refilled completely. After
//! sprinting stops, regeneration waits for a short delay.

use bevy::prelude::*;

use crate::config::LocomotionConfig;

/// Relative tolerance for "stamina is full".
const FULL_TOLERANCE: f32 = 1e-6;

/// Phase of the stamina state machine.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaminaPhase {
    #[default]
    Normal,
    Sprinting,
    /// Sprint locked out until the pool is full again.
    Exhausted,
}

/// Sprint stamina state.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct StaminaState {
    /// Current stamina in `[0, max]`.
    pub current: f32,
    pub is_exhausted: bool,
    /// Whether the actor sprinted on the last update.
    pub sprinting: bool,
    /// Seconds since sprinting last stopped.
    pub time_since_sprint_stopped: f32,
}

impl StaminaState {
    /// A full pool for the given config.
    pub fn full(config: &LocomotionConfig) -> Self {
        Self {
            current: config.stamina_max,
            is_exhausted: false,
            sprinting: false,
            time_since_sprint_stopped: 0.0,
        }
    }

    pub fn phase(&self) -> StaminaPhase {
        if self.is_exhausted {
            StaminaPhase::Exhausted
        } else if self.sprinting {
            StaminaPhase::Sprinting
        } else {
            StaminaPhase::Normal
        }
    }

    /// Fill level in `[0, 1]`.
    pub fn ratio(&self, config: &LocomotionConfig) -> f32 {
        (self.current / config.stamina_max.max(1.0)).clamp(0.0, 1.0)
    }

    /// Whether sprinting may start or continue.
    pub fn can_sprint(&self) -> bool {
        !self.is_exhausted && self.current > 0.0
    }

    /// Advance one tick. Returns whether the actor sprints this tick.
    ///
    /// Draining and the exhaustion check happen together: the tick that
    /// empties the pool already reports no sprint.
    pub fn update(&mut self, wants_sprint: bool, dt: f32, config: &LocomotionConfig) -> bool {
        // A hot-reloaded smaller pool must not leave stamina above max.
        self.current = self.current.clamp(0.0, config.stamina_max);

        if wants_sprint && self.can_sprint() {
            self.sprinting = true;
            self.time_since_sprint_stopped = 0.0;

            self.current -= config.stamina_drain_rate * dt;
            if self.current <= 0.0 {
                self.current = 0.0;
                self.sprinting = false;
                self.is_exhausted = true;
                self.time_since_sprint_stopped = 0.0;
                debug!("stamina exhausted");
            }
        } else {
            if self.sprinting {
                self.sprinting = false;
                self.time_since_sprint_stopped = 0.0;
            } else {
                self.time_since_sprint_stopped += dt;
            }

            if self.time_since_sprint_stopped >= config.stamina_regen_delay {
                self.current = (self.current + config.stamina_regen_rate * dt).min(config.stamina_max);

                if self.is_exhausted && self.is_full(config) {
                    self.is_exhausted = false;
                    debug!("stamina recovered");
                }
            }
        }

        self.sprinting
    }

    fn is_full(&self, config: &LocomotionConfig) -> bool {
        (config.stamina_max - self.current).abs() <= config.stamina_max * FULL_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn config() -> LocomotionConfig {
        LocomotionConfig::default()
    }

    // ==================== Drain Tests ====================

    #[test]
    fn drains_monotonically_until_exhausted() {
        let cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        let step = cfg.stamina_drain_rate * DT;

        let mut ticks = 0;
        loop {
            let before = stamina.current;
            let sprinting = stamina.update(true, DT, &cfg);
            ticks += 1;

            if stamina.current > 0.0 {
                assert!(sprinting);
                assert!(!stamina.is_exhausted);
                assert!((before - stamina.current - step).abs() < 1e-3);
            } else {
                // Same tick that hits zero reports exhaustion and no sprint.
                assert_eq!(stamina.current, 0.0);
                assert!(stamina.is_exhausted);
                assert!(!sprinting);
                break;
            }
            assert!(ticks < 1000, "stamina never ran out");
        }
        // 100 stamina at 0.5 per tick.
        assert!((199..=201).contains(&ticks), "took {ticks} ticks");
    }

    #[test]
    fn no_sprint_without_wanting() {
        let cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        assert!(!stamina.update(false, DT, &cfg));
        assert_eq!(stamina.current, cfg.stamina_max);
        assert_eq!(stamina.phase(), StaminaPhase::Normal);
    }

    // ==================== Regeneration Tests ====================

    #[test]
    fn regen_waits_for_delay() {
        let cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        for _ in 0..10 {
            stamina.update(true, DT, &cfg);
        }
        let drained = stamina.current;

        // Stop tick resets the timer; the delay then holds regen back.
        stamina.update(false, DT, &cfg);
        assert_eq!(stamina.current, drained);
        let delay_ticks = (cfg.stamina_regen_delay / DT).round() as usize;
        for _ in 0..delay_ticks - 1 {
            stamina.update(false, DT, &cfg);
            assert_eq!(stamina.current, drained);
        }

        for _ in 0..3 {
            stamina.update(false, DT, &cfg);
        }
        assert!(stamina.current > drained);
    }

    #[test]
    fn regen_clamps_at_max() {
        let cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        stamina.current = cfg.stamina_max - 0.1;
        stamina.time_since_sprint_stopped = 10.0;
        stamina.update(false, 1.0, &cfg);
        assert_eq!(stamina.current, cfg.stamina_max);
    }

    // ==================== Exhaustion Tests ====================

    #[test]
    fn exhaustion_blocks_sprint_until_full() {
        let cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        while !stamina.is_exhausted {
            stamina.update(true, DT, &cfg);
        }

        // Keep wanting sprint the whole way back up.
        let mut ticks = 0;
        while stamina.current < cfg.stamina_max {
            let sprinting = stamina.update(true, DT, &cfg);
            assert!(!sprinting, "sprinted while exhausted at {}", stamina.current);
            if stamina.current < cfg.stamina_max {
                assert!(stamina.is_exhausted);
            }
            ticks += 1;
            assert!(ticks < 10_000);
        }

        assert!(!stamina.is_exhausted);
        assert_eq!(stamina.phase(), StaminaPhase::Normal);
        assert!(stamina.update(true, DT, &cfg));
        assert_eq!(stamina.phase(), StaminaPhase::Sprinting);
    }

    #[test]
    fn shrinking_pool_clamps_current() {
        let mut cfg = config();
        let mut stamina = StaminaState::full(&cfg);
        cfg.stamina_max = 40.0;
        stamina.update(false, DT, &cfg);
        assert_eq!(stamina.current, 40.0);
        assert_eq!(stamina.ratio(&cfg), 1.0);
    }
}
