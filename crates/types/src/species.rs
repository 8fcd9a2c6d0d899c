//! Participant species policies.

use rand::Rng;
use std::fmt;

/// Inclusive speed range in km/h from which a base speed is sampled once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    pub min_kmh: f64,
    pub max_kmh: f64,
}

impl SpeedRange {
    /// Create a new speed range.
    pub const fn new(min_kmh: f64, max_kmh: f64) -> Self {
        Self { min_kmh, max_kmh }
    }

    /// Sample a base speed uniformly from this range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min_kmh + (self.max_kmh - self.min_kmh) * rng.gen::<f64>()
    }

    /// Whether a speed lies within the range.
    pub fn contains(&self, speed_kmh: f64) -> bool {
        speed_kmh >= self.min_kmh && speed_kmh <= self.max_kmh
    }
}

/// The closed set of participant policies.
///
/// Each species supplies a speed range, a stamina coefficient in `[0, 1]`
/// that dampens fatigue, a display glyph and a default display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Slow, high stamina.
    Tortoise,
    /// Volatile, low stamina.
    Hare,
    /// Fast, medium stamina.
    Horse,
}

impl Species {
    /// Every species, in default line-up order.
    pub const ALL: [Species; 3] = [Species::Tortoise, Species::Hare, Species::Horse];

    /// Speed range in km/h.
    pub const fn speed_range(self) -> SpeedRange {
        match self {
            Species::Tortoise => SpeedRange::new(6.0, 8.0),
            Species::Hare => SpeedRange::new(7.0, 11.0),
            Species::Horse => SpeedRange::new(8.0, 10.0),
        }
    }

    /// Stamina coefficient (higher means fewer fatigue ticks).
    pub const fn stamina(self) -> f64 {
        match self {
            Species::Tortoise => 0.9,
            Species::Hare => 0.5,
            Species::Horse => 0.7,
        }
    }

    /// Glyph used by display collaborators.
    pub const fn glyph(self) -> &'static str {
        match self {
            Species::Tortoise => "🐢",
            Species::Hare => "🐇",
            Species::Horse => "🐎",
        }
    }

    /// Default participant name for this species.
    pub const fn default_name(self) -> &'static str {
        match self {
            Species::Tortoise => "Tortoise",
            Species::Hare => "Hare",
            Species::Horse => "Horse",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}
