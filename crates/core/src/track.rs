//! Shared race state and winner arbitration.

use crate::participant::{Mover, Participant};
use derby_types::tuning::{FINISH_DISTANCE, TICK_INTERVAL};
use derby_types::{ParticipantId, ParticipantSnapshot, Species};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Winner cell value while the race is still open.
const NO_WINNER: usize = usize::MAX;

/// The single source of truth for "is the race over" and "who won".
///
/// Finished and winner are one atomic cell: `NO_WINNER` while open, the
/// winner's line-up index afterwards. A single compare-and-set moves it out
/// of `NO_WINNER`, so both facts change together and only once.
#[derive(Debug)]
pub struct RaceTrack {
    participants: Vec<Arc<Participant>>,
    finish_distance: f64,
    tick_interval: Duration,
    winner: AtomicUsize,
}

impl RaceTrack {
    /// Start building a track with the given finish distance and tick interval.
    pub fn builder(finish_distance: f64, tick_interval: Duration) -> TrackBuilder {
        TrackBuilder::new(finish_distance, tick_interval)
    }

    /// All participants in line-up order.
    pub fn participants(&self) -> &[Arc<Participant>] {
        &self.participants
    }

    /// Look up a participant by id.
    pub fn participant(&self, id: ParticipantId) -> Option<&Arc<Participant>> {
        self.participants.get(id.0)
    }

    /// Distance that ends the race.
    pub fn finish_distance(&self) -> f64 {
        self.finish_distance
    }

    /// Interval between movement ticks.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Try to declare `participant` the winner.
    ///
    /// Returns `true` for exactly one caller: the first to arrive while the
    /// race is open. Every other call, concurrent or later, returns `false`
    /// and leaves the recorded winner untouched. A participant that does not
    /// belong to this track is always rejected.
    pub fn try_declare_winner(&self, participant: &Participant) -> bool {
        let index = participant.id().0;
        let belongs = self
            .participants
            .get(index)
            .is_some_and(|p| std::ptr::eq(Arc::as_ptr(p), participant));
        if !belongs {
            return false;
        }

        self.winner
            .compare_exchange(NO_WINNER, index, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether a winner has been declared.
    pub fn is_finished(&self) -> bool {
        self.winner.load(Ordering::Acquire) != NO_WINNER
    }

    /// The declared winner's id, if any.
    pub fn winner_id(&self) -> Option<ParticipantId> {
        match self.winner.load(Ordering::Acquire) {
            NO_WINNER => None,
            index => Some(ParticipantId(index)),
        }
    }

    /// The declared winner, if any.
    pub fn winner(&self) -> Option<&Arc<Participant>> {
        self.winner_id().and_then(|id| self.participant(id))
    }

    /// Snapshot of all participants ordered by descending position.
    ///
    /// The declared winner always ranks first, even when another participant
    /// crossed the line in the same instant. Other ties keep line-up order.
    pub fn ranking(&self) -> Vec<ParticipantSnapshot> {
        let winner = self.winner_id();
        let mut ranking: Vec<ParticipantSnapshot> =
            self.participants.iter().map(|p| p.snapshot()).collect();
        ranking.sort_by(|a, b| {
            (Some(b.id) == winner)
                .cmp(&(Some(a.id) == winner))
                .then_with(|| b.position.total_cmp(&a.position))
        });
        ranking
    }
}

/// Builds a [`RaceTrack`] and the movers for its participants.
///
/// The participant list is fixed once `build()` returns.
#[derive(Debug)]
pub struct TrackBuilder {
    finish_distance: f64,
    tick_interval: Duration,
    seed: u64,
    entries: Vec<(String, Species)>,
}

impl Default for TrackBuilder {
    fn default() -> Self {
        Self::new(FINISH_DISTANCE, TICK_INTERVAL)
    }
}

impl TrackBuilder {
    /// Create a builder with no participants.
    pub fn new(finish_distance: f64, tick_interval: Duration) -> Self {
        Self {
            finish_distance,
            tick_interval,
            seed: 0,
            entries: Vec::new(),
        }
    }

    /// Seed from which each participant's generator is derived.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add a participant to the line-up.
    pub fn add(mut self, name: impl Into<String>, species: Species) -> Self {
        self.entries.push((name.into(), species));
        self
    }

    /// Add one participant per species, named after the species.
    pub fn with_default_lineup(mut self) -> Self {
        for species in Species::ALL {
            self.entries
                .push((species.default_name().to_string(), species));
        }
        self
    }

    /// Build the shared track and one mover per participant.
    ///
    /// Participant `i` gets a `ChaCha8Rng` seeded with `seed + i`.
    pub fn build(self) -> (Arc<RaceTrack>, Vec<Mover>) {
        let mut participants = Vec::with_capacity(self.entries.len());
        let mut movers = Vec::with_capacity(self.entries.len());

        for (index, (name, species)) in self.entries.into_iter().enumerate() {
            let rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(index as u64));
            let (participant, mover) =
                Participant::create(ParticipantId(index), name, species, rng);
            participants.push(participant);
            movers.push(mover);
        }

        let track = Arc::new(RaceTrack {
            participants,
            finish_distance: self.finish_distance,
            tick_interval: self.tick_interval,
            winner: AtomicUsize::new(NO_WINNER),
        });

        (track, movers)
    }
}
