//! Race-wide constants and the per-tick speed model.

use std::time::Duration;

/// Distance (in units, 1 unit = 1 metre) that ends the race.
pub const FINISH_DISTANCE: f64 = 50.0;

/// Interval between two movement ticks of a participant.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Interval at which the orchestrator polls the race state.
pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded wait for each participant task during shutdown.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay after stopping so late readers see settled state.
pub const STABILIZATION_DELAY: Duration = Duration::from_millis(200);

/// Default refresh interval of the live ranking observer.
pub const OBSERVER_INTERVAL: Duration = Duration::from_millis(2000);

/// Grace period before the observer publishes its first ranking.
pub const OBSERVER_GRACE: Duration = Duration::from_secs(1);

/// Probability of a speed boost on any tick.
pub const BOOST_PROBABILITY: f64 = 0.15;

/// Base probability of fatigue before stamina is applied.
pub const FATIGUE_PROBABILITY: f64 = 0.20;

/// Speed multiplier on a boost tick.
pub const BOOST_MULTIPLIER: f64 = 1.5;

/// Speed multiplier on a fatigue tick.
pub const FATIGUE_MULTIPLIER: f64 = 0.7;

/// Outcome of the per-tick speed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedOutcome {
    Boost,
    Fatigue,
    Normal,
}

impl SpeedOutcome {
    /// Select an outcome from a single uniform draw in `[0, 1)`.
    ///
    /// Thresholds are cumulative, boost first, so boost and fatigue are
    /// mutually exclusive within one tick.
    pub fn from_draw(draw: f64, stamina: f64) -> Self {
        if draw < BOOST_PROBABILITY {
            SpeedOutcome::Boost
        } else if draw < BOOST_PROBABILITY + fatigue_probability(stamina) {
            SpeedOutcome::Fatigue
        } else {
            SpeedOutcome::Normal
        }
    }

    /// Multiplier applied to the base speed.
    pub fn multiplier(self) -> f64 {
        match self {
            SpeedOutcome::Boost => BOOST_MULTIPLIER,
            SpeedOutcome::Fatigue => FATIGUE_MULTIPLIER,
            SpeedOutcome::Normal => 1.0,
        }
    }
}

/// Fatigue probability after stamina dampening.
pub fn fatigue_probability(stamina: f64) -> f64 {
    FATIGUE_PROBABILITY * (1.0 - stamina * 0.5)
}

/// Distance covered at `speed_kmh` during `interval`.
pub fn distance_for(speed_kmh: f64, interval: Duration) -> f64 {
    speed_kmh * 1000.0 / 3600.0 * interval.as_secs_f64()
}
