//! Configuration for a single race.

use derby_types::tuning::{FINISH_DISTANCE, TICK_INTERVAL};
use derby_types::Species;
use std::collections::HashSet;
use std::time::Duration;

/// Shortest accepted tick interval.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Longest accepted tick interval.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// One participant in the line-up.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrant {
    /// Participant name, unique within the line-up.
    pub name: String,
    /// Species policy.
    pub species: Species,
}

impl Entrant {
    /// Create a new entrant.
    pub fn new(name: impl Into<String>, species: Species) -> Self {
        Self {
            name: name.into(),
            species,
        }
    }
}

impl From<Species> for Entrant {
    fn from(species: Species) -> Self {
        Self::new(species.default_name(), species)
    }
}

/// Configuration for a race.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Distance that ends the race.
    pub finish_distance: f64,

    /// Interval between movement ticks.
    pub tick_interval: Duration,

    /// Participants in line-up order.
    pub lineup: Vec<Entrant>,

    /// Seed for the participants' generators. `None` draws a fresh seed per race.
    pub seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            finish_distance: FINISH_DISTANCE,
            tick_interval: TICK_INTERVAL,
            lineup: Species::ALL.into_iter().map(Entrant::from).collect(),
            seed: None,
        }
    }
}

impl RaceConfig {
    /// Create a configuration with the default line-up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the finish distance.
    pub fn with_finish_distance(mut self, distance: f64) -> Self {
        self.finish_distance = distance;
        self
    }

    /// Set the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Replace the line-up.
    pub fn with_lineup(mut self, lineup: Vec<Entrant>) -> Self {
        self.lineup = lineup;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of participants.
    pub fn num_participants(&self) -> usize {
        self.lineup.len()
    }

    /// Check the configuration before a race starts.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.finish_distance.is_finite() || self.finish_distance <= 0.0 {
            return Err(format!(
                "finish distance must be positive and finite, got {}",
                self.finish_distance
            ));
        }

        if self.tick_interval < MIN_TICK_INTERVAL || self.tick_interval > MAX_TICK_INTERVAL {
            return Err(format!(
                "tick interval must be within {:?}..={:?}, got {:?}",
                MIN_TICK_INTERVAL, MAX_TICK_INTERVAL, self.tick_interval
            ));
        }

        if self.lineup.is_empty() {
            return Err("line-up must contain at least one participant".to_string());
        }

        let mut seen = HashSet::new();
        for entrant in &self.lineup {
            if entrant.name.trim().is_empty() {
                return Err("participant names must not be empty".to_string());
            }
            if !seen.insert(entrant.name.as_str()) {
                return Err(format!("duplicate participant name '{}'", entrant.name));
            }
        }

        Ok(())
    }
}
