//! Core race state for the Derby simulator.
//!
//! This crate provides the state every round is built around:
//!
//! - [`Participant`]: one racer's public state, readable from any thread
//! - [`Mover`]: the single writer of a participant's state; applies ticks
//! - [`RaceTrack`]: the shared race state with single-winner arbitration
//!
//! # Architecture
//!
//! ```text
//!   TrackBuilder::build()
//!        │
//!        ├──► Arc<RaceTrack> ──────────── shared by orchestrator, observer, movers
//!        │        │
//!        │        └── Vec<Arc<Participant>>   (read-only after build)
//!        │
//!        └──► Vec<Mover>  (one per participant, moved into its task)
//!                 │
//!                 └── tick(&track): draw speed → advance → clamp → try_declare_winner
//! ```
//!
//! The only state written by more than one actor is the winner cell inside
//! [`RaceTrack`], and it is written through one compare-and-set.
//! Everything else has exactly one writer, the participant's own [`Mover`].
//!
//! This crate is synchronous: no async, no sleeping. Scheduling, cancellation
//! and shutdown are handled by `derby-parallel`.

mod participant;
mod track;

pub use participant::{Mover, Participant, TickReport};
pub use track::{RaceTrack, TrackBuilder};
