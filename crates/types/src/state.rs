//! Participant identity and read-only views.

use crate::Species;
use std::fmt;

/// Index of a participant within its race line-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub usize);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Point-in-time copy of a participant's public state.
///
/// This is what display collaborators, the observer and the statistics fold
/// consume; it carries no reference back into the running race.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSnapshot {
    /// Index within the line-up.
    pub id: ParticipantId,
    /// Participant name (unique within a race).
    pub name: String,
    /// Species policy.
    pub species: Species,
    /// Distance covered, clamped to the finish distance.
    pub position: f64,
    /// Base speed in km/h, sampled once at creation.
    pub base_speed: f64,
    /// Speed in km/h applied on the most recent tick.
    pub current_speed: f64,
    /// Whether the participant reached the finish distance.
    pub finished: bool,
    /// Number of movement ticks applied.
    pub ticks: u64,
}

impl ParticipantSnapshot {
    /// Display glyph of the participant's species.
    pub fn glyph(&self) -> &'static str {
        self.species.glyph()
    }

    /// Progress towards `finish_distance` in `[0, 1]`.
    pub fn progress(&self, finish_distance: f64) -> f64 {
        if finish_distance <= 0.0 {
            return 1.0;
        }
        (self.position / finish_distance).clamp(0.0, 1.0)
    }
}

impl fmt::Display for ParticipantSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} km/h)", self.name, self.base_speed)
    }
}
