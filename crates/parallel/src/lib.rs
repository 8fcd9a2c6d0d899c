//! Concurrent race execution.
//!
//! Each participant runs as an independent tokio task on the multi-thread
//! runtime. The [`Race`] orchestrator spawns them together, polls the shared
//! [`RaceTrack`](derby_core::RaceTrack) until a winner is declared, then stops
//! every task with a bounded wait.
//!
//! # Non-Goals
//!
//! - **Determinism**: seeds fix each participant's random draws, not the
//!   interleaving of their tasks. Two runs with the same seed can produce
//!   different winners.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Race                                 │
//! │            (orchestrator - caller's task, polls 100ms)           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │   │ Participant  │  │ Participant  │  │ Participant  │  ...      │
//! │   │   (task)     │  │   (task)     │  │   (task)     │           │
//! │   │  Mover+rng   │  │  Mover+rng   │  │  Mover+rng   │           │
//! │   └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │          │ tick / try_declare_winner         │                   │
//! │          └─────────────────┼─────────────────┘                   │
//! │                  ┌─────────▼─────────┐                           │
//! │                  │     RaceTrack     │◄──── RankingObserver      │
//! │                  │  (winner CAS)     │      (optional task)      │
//! │                  └───────────────────┘                           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shutdown is cooperative: every task gets a oneshot signal, checked before
//! each tick and raced against its sleep. Tasks that miss the one second
//! join deadline are aborted and reported in the [`StopReport`].

mod config;
mod observer;
mod participant_task;
mod race;

pub use config::{Entrant, RaceConfig, MAX_TICK_INTERVAL, MIN_TICK_INTERVAL};
pub use observer::{
    validate_interval, LiveRanking, ObserverHandle, RankingObserver, RankingSink, TracingSink,
    MAX_OBSERVER_INTERVAL, MIN_OBSERVER_INTERVAL,
};
pub use participant_task::{
    stop_participants, LoopExit, ParticipantHandle, ParticipantTask, StopReport,
};
pub use race::{Race, RaceError, RaceOutcome, RacePhase};
