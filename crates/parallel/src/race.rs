//! Race orchestrator.
//!
//! Manages the lifecycle of a single race:
//! 1. Builds the shared track and one task per participant
//! 2. Spawns every task back-to-back
//! 3. Polls the track until a winner is declared (or an external shutdown)
//! 4. Signals and joins every task with a bounded wait
//! 5. Exposes the winner and the final ranking

use crate::config::RaceConfig;
use crate::participant_task::{stop_participants, ParticipantHandle, ParticipantTask, StopReport};
use derby_core::RaceTrack;
use derby_types::tuning::{MONITOR_POLL_INTERVAL, STABILIZATION_DELAY};
use derby_types::ParticipantSnapshot;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{info, warn};

/// Errors from race orchestration.
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("Invalid race configuration: {0}")]
    InvalidConfig(String),
    #[error("Race is {actual}, expected {expected}")]
    InvalidPhase {
        expected: RacePhase,
        actual: RacePhase,
    },
    #[error("Race monitoring was interrupted before a winner was declared")]
    Interrupted,
    #[error("Race completed without a winner")]
    NoWinner,
}

/// Lifecycle phase of a [`Race`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    Idle,
    Initialized,
    Running,
    Monitoring,
    Stopping,
    Completed,
}

impl fmt::Display for RacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RacePhase::Idle => "idle",
            RacePhase::Initialized => "initialized",
            RacePhase::Running => "running",
            RacePhase::Monitoring => "monitoring",
            RacePhase::Stopping => "stopping",
            RacePhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Result of a decided race.
#[derive(Debug, Clone)]
pub struct RaceOutcome {
    /// The participant that won the arbitration.
    pub winner: ParticipantSnapshot,
    /// All participants by descending final position.
    pub ranking: Vec<ParticipantSnapshot>,
    /// How the participant tasks were stopped.
    pub stop_report: StopReport,
    /// Time from start to completion.
    pub elapsed: Duration,
    /// Seed the participants' generators were derived from.
    pub seed: u64,
}

impl RaceOutcome {
    /// Non-fatal warnings raised while stopping.
    pub fn warnings(&self) -> Vec<String> {
        self.stop_report.warnings()
    }
}

/// Race orchestrator.
///
/// Drives one race through `Idle → Initialized → Running → Monitoring →
/// Stopping → Completed`. Each lifecycle call checks the current phase and
/// fails with [`RaceError::InvalidPhase`] when called out of order.
pub struct Race {
    config: RaceConfig,
    phase: RacePhase,
    seed: u64,
    track: Option<Arc<RaceTrack>>,
    /// Built but not yet spawned (Initialized).
    pending: Vec<(ParticipantTask, oneshot::Sender<()>)>,
    /// Spawned tasks (Running / Monitoring).
    handles: Vec<ParticipantHandle>,
    stop_report: Option<StopReport>,
    started_at: Option<Instant>,
    elapsed: Option<Duration>,
}

impl Race {
    /// Create a race. The configuration is validated up front.
    pub fn new(config: RaceConfig) -> Result<Self, RaceError> {
        config.validate().map_err(RaceError::InvalidConfig)?;
        let seed = config.seed.unwrap_or_else(rand::random);

        Ok(Self {
            config,
            phase: RacePhase::Idle,
            seed,
            track: None,
            pending: Vec::new(),
            handles: Vec::new(),
            stop_report: None,
            started_at: None,
            elapsed: None,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Seed used for this race.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Configuration this race was created with.
    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Shared track, available once initialized.
    pub fn track(&self) -> Option<&Arc<RaceTrack>> {
        self.track.as_ref()
    }

    /// How the participant tasks were stopped, once stopping is done.
    pub fn stop_report(&self) -> Option<&StopReport> {
        self.stop_report.as_ref()
    }

    fn expect_phase(&self, expected: RacePhase) -> Result<(), RaceError> {
        if self.phase != expected {
            return Err(RaceError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Build the track and one task per participant. Nothing moves yet.
    pub fn initialize(&mut self) -> Result<Arc<RaceTrack>, RaceError> {
        self.expect_phase(RacePhase::Idle)?;

        let mut builder = RaceTrack::builder(self.config.finish_distance, self.config.tick_interval)
            .with_seed(self.seed);
        for entrant in &self.config.lineup {
            builder = builder.add(entrant.name.clone(), entrant.species);
        }
        let (track, movers) = builder.build();

        self.pending = movers
            .into_iter()
            .map(|mover| ParticipantTask::new(mover, Arc::clone(&track)))
            .collect();
        self.track = Some(Arc::clone(&track));
        self.phase = RacePhase::Initialized;

        info!(
            participants = track.participants().len(),
            finish_distance = track.finish_distance(),
            tick_ms = track.tick_interval().as_millis() as u64,
            seed = self.seed,
            "Race initialized"
        );

        Ok(track)
    }

    /// Spawn every participant task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), RaceError> {
        self.expect_phase(RacePhase::Initialized)?;

        self.started_at = Some(Instant::now());
        self.handles = self
            .pending
            .drain(..)
            .map(|(task, shutdown)| task.spawn(shutdown))
            .collect();
        self.phase = RacePhase::Running;

        info!(participants = self.handles.len(), "Race started");
        Ok(())
    }

    /// Block until the race is decided, then stop all tasks.
    pub async fn monitor(&mut self) -> Result<RaceOutcome, RaceError> {
        self.monitor_until(std::future::pending::<()>()).await
    }

    /// Like [`monitor`](Self::monitor), but also stops when `shutdown` resolves.
    ///
    /// Stopping always runs before this returns. If `shutdown` fires first
    /// and nobody has won, the result is [`RaceError::Interrupted`].
    pub async fn monitor_until<F>(&mut self, shutdown: F) -> Result<RaceOutcome, RaceError>
    where
        F: Future,
    {
        self.expect_phase(RacePhase::Running)?;
        self.phase = RacePhase::Monitoring;
        let track = Arc::clone(self.track.as_ref().ok_or(RaceError::NoWinner)?);

        tokio::pin!(shutdown);
        let mut interrupted = false;
        while !track.is_finished() {
            tokio::select! {
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
                _ = tokio::time::sleep(MONITOR_POLL_INTERVAL) => {}
            }
        }

        self.stop().await;

        if interrupted && !track.is_finished() {
            warn!("Race monitoring interrupted before a winner was declared");
            return Err(RaceError::Interrupted);
        }

        self.outcome()
    }

    async fn stop(&mut self) {
        self.phase = RacePhase::Stopping;

        let report = stop_participants(std::mem::take(&mut self.handles)).await;
        if !report.is_clean() {
            warn!(
                abandoned = report.abandoned.len(),
                "Some participant tasks had to be aborted"
            );
        }

        tokio::time::sleep(STABILIZATION_DELAY).await;

        self.elapsed = self.started_at.map(|t| t.elapsed());
        self.stop_report = Some(report);
        self.phase = RacePhase::Completed;
    }

    /// The declared winner, if any.
    pub fn winner(&self) -> Option<ParticipantSnapshot> {
        self.track.as_ref()?.winner().map(|p| p.snapshot())
    }

    /// All participants by descending position, once the race is completed.
    pub fn final_ranking(&self) -> Result<Vec<ParticipantSnapshot>, RaceError> {
        self.expect_phase(RacePhase::Completed)?;
        Ok(self
            .track
            .as_ref()
            .map(|track| track.ranking())
            .unwrap_or_default())
    }

    /// Assemble the outcome of a completed race.
    pub fn outcome(&self) -> Result<RaceOutcome, RaceError> {
        let ranking = self.final_ranking()?;
        let winner = self.winner().ok_or(RaceError::NoWinner)?;

        info!(
            winner = %winner.name,
            elapsed_ms = self.elapsed.unwrap_or_default().as_millis() as u64,
            "Race complete"
        );

        Ok(RaceOutcome {
            winner,
            ranking,
            stop_report: self.stop_report.clone().unwrap_or_default(),
            elapsed: self.elapsed.unwrap_or_default(),
            seed: self.seed,
        })
    }

    /// Run a complete race: initialize, start, monitor.
    pub async fn run(mut self) -> Result<RaceOutcome, RaceError> {
        self.initialize()?;
        self.start()?;
        self.monitor().await
    }
}
