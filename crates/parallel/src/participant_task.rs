//! Per-participant movement task.
//!
//! Each participant runs as an independent tokio task that owns its
//! [`Mover`]. The task ticks at the track's interval until the race is
//! decided, the participant finishes, or a shutdown signal arrives.

use derby_core::{Mover, RaceTrack};
use derby_types::tuning::STOP_JOIN_TIMEOUT;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A participant's movement loop, ready to be spawned.
pub struct ParticipantTask {
    mover: Mover,
    track: Arc<RaceTrack>,
    shutdown_rx: oneshot::Receiver<()>,
}

/// Handle to a spawned participant task.
pub struct ParticipantHandle {
    name: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

/// Why a participant loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Another participant won, or this one finished.
    RaceOver,
    /// A shutdown signal was observed.
    Shutdown,
}

impl ParticipantTask {
    /// Create a task for `mover` on `track`.
    ///
    /// Returns the task and the sender that shuts it down.
    pub fn new(mover: Mover, track: Arc<RaceTrack>) -> (Self, oneshot::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = Self {
            mover,
            track,
            shutdown_rx,
        };
        (task, shutdown_tx)
    }

    /// Name of the participant this task drives.
    pub fn name(&self) -> &str {
        self.mover.participant().name()
    }

    /// Spawn the task on the current tokio runtime.
    pub fn spawn(self, shutdown: oneshot::Sender<()>) -> ParticipantHandle {
        let name = self.name().to_string();
        let join = tokio::spawn(async move {
            self.run().await;
        });
        ParticipantHandle {
            name,
            shutdown: Some(shutdown),
            join,
        }
    }

    /// Run the movement loop to completion.
    ///
    /// Shutdown is checked before every tick and raced against the sleep, so
    /// a stopped task never applies another tick. A dropped sender counts as
    /// shutdown.
    pub async fn run(mut self) -> LoopExit {
        let interval = self.track.tick_interval();

        let exit = loop {
            match self.shutdown_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Closed) => break LoopExit::Shutdown,
            }

            if !self.mover.should_continue(&self.track) {
                break LoopExit::RaceOver;
            }

            let report = self.mover.tick(&self.track);
            if report.finished {
                break LoopExit::RaceOver;
            }

            tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => break LoopExit::Shutdown,
                _ = tokio::time::sleep(interval) => {}
            }
        };

        let participant = self.mover.participant();
        debug!(
            participant = participant.name(),
            position = participant.position(),
            ticks = participant.ticks(),
            ?exit,
            "Participant loop ended"
        );
        exit
    }
}

impl ParticipantHandle {
    /// Participant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task has already ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Send the shutdown signal. Returns `false` if already sent.
    pub fn signal_shutdown(&mut self) -> bool {
        match self.shutdown.take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    fn abort(&self) {
        self.join.abort();
    }
}

impl Drop for ParticipantHandle {
    fn drop(&mut self) {
        if !self.join.is_finished() {
            self.join.abort();
        }
    }
}

/// Result of stopping a set of participant tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Tasks that were still running when shutdown was signalled.
    pub signalled: usize,
    /// Tasks that ended within the bounded wait.
    pub joined: usize,
    /// Tasks that missed the bounded wait and were aborted.
    pub abandoned: Vec<String>,
}

impl StopReport {
    /// Whether every task ended within the bounded wait.
    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }

    /// Human-readable warnings for tasks that missed the deadline.
    pub fn warnings(&self) -> Vec<String> {
        self.abandoned
            .iter()
            .map(|name| {
                format!(
                    "participant '{}' did not stop within {:?} and was aborted",
                    name, STOP_JOIN_TIMEOUT
                )
            })
            .collect()
    }
}

/// Stop every participant task.
///
/// Signals all tasks that are still active first, then waits for each one
/// individually for up to [`STOP_JOIN_TIMEOUT`]. Tasks that miss the
/// deadline are aborted and recorded as abandoned.
pub async fn stop_participants(handles: Vec<ParticipantHandle>) -> StopReport {
    let mut handles = handles;
    let mut report = StopReport::default();

    for handle in handles.iter_mut() {
        if !handle.is_finished() {
            report.signalled += 1;
        }
        handle.signal_shutdown();
    }

    for mut handle in handles {
        match tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut handle.join).await {
            Ok(_) => report.joined += 1,
            Err(_) => {
                warn!(
                    participant = handle.name(),
                    timeout_ms = STOP_JOIN_TIMEOUT.as_millis() as u64,
                    "Participant task did not stop in time, aborting"
                );
                handle.abort();
                report.abandoned.push(handle.name.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::Species;
    use std::time::Duration;

    fn single(finish: f64) -> (Arc<RaceTrack>, Mover) {
        let (track, mut movers) = RaceTrack::builder(finish, Duration::from_millis(500))
            .with_seed(5)
            .add("Solo", Species::Horse)
            .build();
        (track, movers.remove(0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_runs_until_finish() {
        let (track, mover) = single(3.0);
        let (task, _shutdown) = ParticipantTask::new(mover, Arc::clone(&track));

        let exit = task.run().await;

        assert_eq!(exit, LoopExit::RaceOver);
        assert!(track.is_finished());
        let solo = &track.participants()[0];
        assert!(solo.is_finished());
        assert_eq!(solo.position(), 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_stops_on_shutdown() {
        let (track, mover) = single(1_000_000.0);
        let (task, shutdown) = ParticipantTask::new(mover, Arc::clone(&track));
        let mut handle = task.spawn(shutdown);

        tokio::time::sleep(Duration::from_millis(1_600)).await;
        assert!(handle.signal_shutdown());
        assert!(!handle.signal_shutdown());

        let report = stop_participants(vec![handle]).await;
        assert!(report.is_clean());
        assert_eq!(report.joined, 1);

        // No tick lands after shutdown
        let solo = &track.participants()[0];
        let ticks = solo.ticks();
        let position = solo.position();
        assert!(ticks > 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(solo.ticks(), ticks);
        assert_eq!(solo.position(), position);
        assert!(!track.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (track, mover) = single(1_000_000.0);
        let (task, shutdown) = ParticipantTask::new(mover, track);
        drop(shutdown);

        assert_eq!(task.run().await, LoopExit::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_task_is_abandoned() {
        let (tx, _rx) = oneshot::channel();
        let handle = ParticipantHandle {
            name: "Stuck".to_string(),
            shutdown: Some(tx),
            join: tokio::spawn(std::future::pending::<()>()),
        };

        let report = stop_participants(vec![handle]).await;

        assert_eq!(report.signalled, 1);
        assert_eq!(report.joined, 0);
        assert_eq!(report.abandoned, vec!["Stuck".to_string()]);
        assert!(!report.is_clean());
        assert_eq!(report.warnings().len(), 1);
    }
}
