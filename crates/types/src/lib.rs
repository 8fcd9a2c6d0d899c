//! Foundational types for the Derby race simulator.
//!
//! This crate holds the small, dependency-light vocabulary shared by every
//! other crate in the workspace:
//!
//! - [`Species`]: the closed set of participant policies (speed range, stamina, glyph)
//! - [`SpeedOutcome`]: the per-tick boost / fatigue / normal draw
//! - [`ParticipantId`] and [`ParticipantSnapshot`]: identity and read-only views
//! - [`tuning`]: race-wide constants and the km/h → distance conversion
//!
//! Nothing in here is concurrent. The shared race state lives in `derby-core`
//! and the tasks that drive it live in `derby-parallel`.

mod species;
mod state;
pub mod tuning;

pub use species::{Species, SpeedRange};
pub use state::{ParticipantId, ParticipantSnapshot};
pub use tuning::SpeedOutcome;
