//! Multi-round tournaments on top of the concurrent race orchestrator.
//!
//! A [`Tournament`] runs one [`Race`](derby_parallel::Race) per round,
//! strictly one after another, and folds each final ranking into
//! [`RaceStatistics`]. The `derby-sim` binary wraps both a single race and a
//! tournament behind a small CLI.
//!
//! ```text
//! Tournament ──round 1..=N──► Race ──RaceOutcome──► RaceStatistics
//!                                                        │
//!                                          TournamentReport::print_summary
//! ```

mod config;
mod report;
mod statistics;
mod tournament;

pub use config::{TournamentConfig, MAX_ROUNDS};
pub use report::{RoundSummary, TournamentReport};
pub use statistics::{ParticipantStats, RaceStatistics, StatsError};
pub use tournament::{Tournament, TournamentError};
