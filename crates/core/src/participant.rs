//! Participant state and its single writer.

use crate::RaceTrack;
use derby_types::tuning::distance_for;
use derby_types::{ParticipantId, ParticipantSnapshot, Species, SpeedOutcome};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// `f64` stored as bits in an `AtomicU64`.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// One racer's public state.
///
/// Shared behind an `Arc` with the track, the orchestrator and the observer.
/// All accessors are lock-free reads. Mutation only happens through the
/// participant's [`Mover`].
#[derive(Debug)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    species: Species,
    base_speed: f64,
    current_speed: AtomicF64,
    position: AtomicF64,
    finished: AtomicBool,
    ticks: AtomicU64,
}

impl Participant {
    /// Create a participant and the mover that owns its writes.
    ///
    /// The base speed is drawn once from the species range using `rng`, which
    /// then stays with the mover for the per-tick draws.
    pub(crate) fn create(
        id: ParticipantId,
        name: String,
        species: Species,
        mut rng: ChaCha8Rng,
    ) -> (Arc<Self>, Mover) {
        let base_speed = species.speed_range().sample(&mut rng);
        let participant = Arc::new(Self {
            id,
            name,
            species,
            base_speed,
            current_speed: AtomicF64::new(base_speed),
            position: AtomicF64::new(0.0),
            finished: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        });
        let mover = Mover {
            participant: Arc::clone(&participant),
            rng,
        };
        (participant, mover)
    }

    /// Index within the line-up.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Participant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Species policy.
    pub fn species(&self) -> Species {
        self.species
    }

    /// Display glyph.
    pub fn glyph(&self) -> &'static str {
        self.species.glyph()
    }

    /// Stamina coefficient.
    pub fn stamina(&self) -> f64 {
        self.species.stamina()
    }

    /// Base speed in km/h.
    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    /// Speed in km/h applied on the latest tick.
    pub fn current_speed(&self) -> f64 {
        self.current_speed.load()
    }

    /// Distance covered so far.
    pub fn position(&self) -> f64 {
        self.position.load()
    }

    /// Whether the finish distance was reached.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Number of ticks applied.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Copy the current public state.
    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: self.id,
            name: self.name.clone(),
            species: self.species,
            position: self.position(),
            base_speed: self.base_speed,
            current_speed: self.current_speed(),
            finished: self.is_finished(),
            ticks: self.ticks(),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Speed draw for this tick.
    pub outcome: SpeedOutcome,
    /// Distance added (after clamping to the finish distance).
    pub distance: f64,
    /// Whether this tick reached the finish distance.
    pub finished: bool,
    /// Whether this tick won the arbitration.
    pub won: bool,
}

/// Exclusive writer of one participant's state.
///
/// Not `Clone`: exactly one mover exists per participant, and it is moved
/// into the participant's task.
#[derive(Debug)]
pub struct Mover {
    participant: Arc<Participant>,
    rng: ChaCha8Rng,
}

impl Mover {
    /// The participant this mover drives.
    pub fn participant(&self) -> &Arc<Participant> {
        &self.participant
    }

    /// Whether another tick should run on `track`.
    pub fn should_continue(&self, track: &RaceTrack) -> bool {
        !track.is_finished() && !self.participant.is_finished()
    }

    /// Apply one movement tick.
    ///
    /// Recomputes the current speed from a single uniform draw, advances by
    /// `speed × tick interval`, clamps at the finish distance and, on
    /// reaching it, attempts to claim victory on `track`.
    pub fn tick(&mut self, track: &RaceTrack) -> TickReport {
        let participant = &self.participant;

        let outcome = SpeedOutcome::from_draw(self.rng.gen::<f64>(), participant.stamina());
        let speed = participant.base_speed * outcome.multiplier();
        participant.current_speed.store(speed);

        let finish = track.finish_distance();
        let before = participant.position();
        let mut after = before + distance_for(speed, track.tick_interval());
        let finished = after >= finish;
        if finished {
            after = finish;
        }
        participant.position.store(after);
        participant.ticks.fetch_add(1, Ordering::AcqRel);

        let mut won = false;
        if finished {
            participant.finished.store(true, Ordering::Release);
            won = track.try_declare_winner(participant);
            tracing::debug!(
                participant = participant.name(),
                won,
                ticks = participant.ticks(),
                "Reached finish distance"
            );
        }

        TickReport {
            outcome,
            distance: after - before,
            finished,
            won,
        }
    }
}
