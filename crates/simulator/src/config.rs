//! Configuration types for the tournament runner.

use derby_parallel::{validate_interval, RaceConfig};
use derby_types::tuning::OBSERVER_INTERVAL;
use std::time::Duration;

/// Largest accepted number of rounds.
pub const MAX_ROUNDS: usize = 100;

/// Seed stride between consecutive rounds when a base seed is given.
const ROUND_SEED_STRIDE: u64 = 1_000;

/// Configuration for a tournament.
#[derive(Clone, Debug)]
pub struct TournamentConfig {
    /// Number of rounds to run.
    pub rounds: usize,

    /// Whether to run the live ranking observer during each round.
    pub use_observer: bool,

    /// Observer refresh interval.
    pub observer_interval: Duration,

    /// Pause between non-final rounds.
    pub inter_round_pause: Duration,

    /// Race configuration used for every round.
    pub race: RaceConfig,
}

impl TournamentConfig {
    /// Create a new tournament configuration.
    pub fn new(rounds: usize, use_observer: bool) -> Self {
        Self {
            rounds,
            use_observer,
            observer_interval: OBSERVER_INTERVAL,
            inter_round_pause: Duration::ZERO,
            race: RaceConfig::default(),
        }
    }

    /// Set the observer refresh interval.
    pub fn with_observer_interval(mut self, interval: Duration) -> Self {
        self.observer_interval = interval;
        self
    }

    /// Set the pause between rounds.
    pub fn with_inter_round_pause(mut self, pause: Duration) -> Self {
        self.inter_round_pause = pause;
        self
    }

    /// Set the race configuration.
    pub fn with_race(mut self, race: RaceConfig) -> Self {
        self.race = race;
        self
    }

    /// Race configuration for a given round (1-based).
    ///
    /// With a base seed, each round gets its own derived seed so rounds do
    /// not repeat the same draws.
    pub fn race_for_round(&self, round: usize) -> RaceConfig {
        let mut race = self.race.clone();
        race.seed = self
            .race
            .seed
            .map(|seed| seed.wrapping_add(round as u64 * ROUND_SEED_STRIDE));
        race
    }

    /// Check the configuration before any round starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.rounds == 0 || self.rounds > MAX_ROUNDS {
            return Err(format!(
                "rounds must be within 1..={}, got {}",
                MAX_ROUNDS, self.rounds
            ));
        }

        if self.use_observer {
            validate_interval(self.observer_interval).map_err(|e| e.to_string())?;
        }

        self.race.validate()
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self::new(3, false)
    }
}
