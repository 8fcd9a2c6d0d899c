//! Live ranking observer.
//!
//! The observer is an independent task that periodically snapshots the
//! participants of a running race, ordered by position, and hands the
//! snapshot to a [`RankingSink`]. It only reads; it never touches race state.
//!
//! Publishing is best-effort. A sink whose receiver has gone away is not an
//! error, and a late tick is simply late.

use crate::RaceError;
use derby_core::RaceTrack;
use derby_types::tuning::{OBSERVER_GRACE, OBSERVER_INTERVAL, STOP_JOIN_TIMEOUT};
use derby_types::ParticipantSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Shortest accepted refresh interval.
pub const MIN_OBSERVER_INTERVAL: Duration = Duration::from_millis(10);

/// Longest accepted refresh interval.
pub const MAX_OBSERVER_INTERVAL: Duration = Duration::from_secs(60);

/// Cells in a rendered progress bar.
const PROGRESS_BAR_CELLS: usize = 20;

/// A ranking snapshot published by the observer.
#[derive(Debug, Clone)]
pub struct LiveRanking {
    /// Sequence number, starting at 0.
    pub sequence: u64,
    /// Time since the observer started.
    pub elapsed: Duration,
    /// Finish distance of the race being observed.
    pub finish_distance: f64,
    /// Participants ordered by descending position.
    pub entries: Vec<ParticipantSnapshot>,
}

impl LiveRanking {
    /// The participant currently in front.
    pub fn leader(&self) -> Option<&ParticipantSnapshot> {
        self.entries.first()
    }

    /// Render one line per participant with a progress bar.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (rank, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. {:<10} {} {:.1}/{:.0}\n",
                rank + 1,
                entry.name,
                progress_bar(entry.progress(self.finish_distance)),
                entry.position,
                self.finish_distance,
            ));
        }
        out
    }
}

fn progress_bar(progress: f64) -> String {
    let filled = ((progress * PROGRESS_BAR_CELLS as f64) as usize).min(PROGRESS_BAR_CELLS);
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(PROGRESS_BAR_CELLS - filled)
    )
}

/// Destination for live rankings.
pub trait RankingSink: Send + 'static {
    /// Publish one ranking. Must not block for long.
    fn publish(&mut self, ranking: LiveRanking);
}

impl RankingSink for mpsc::UnboundedSender<LiveRanking> {
    fn publish(&mut self, ranking: LiveRanking) {
        // Receiver dropped means nobody is watching any more
        let _ = self.send(ranking);
    }
}

/// Sink that logs each ranking through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RankingSink for TracingSink {
    fn publish(&mut self, ranking: LiveRanking) {
        info!(
            sequence = ranking.sequence,
            leader = ranking.leader().map(|l| l.name.as_str()).unwrap_or("-"),
            "Live ranking\n{}",
            ranking.render()
        );
    }
}

/// Periodic ranking task.
pub struct RankingObserver<S: RankingSink> {
    track: Arc<RaceTrack>,
    interval: Duration,
    sink: S,
    shutdown_rx: oneshot::Receiver<()>,
    published: Arc<AtomicU64>,
}

/// Handle to a running observer.
pub struct ObserverHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
    published: Arc<AtomicU64>,
}

impl<S: RankingSink> RankingObserver<S> {
    /// Start observing `track` with the default interval.
    pub fn start_default(track: Arc<RaceTrack>, sink: S) -> ObserverHandle {
        // The default interval is always within bounds
        Self::spawn(track, OBSERVER_INTERVAL, sink)
    }

    /// Start observing `track`, publishing every `interval`.
    ///
    /// The first ranking is published after a one second grace period.
    pub fn start(
        track: Arc<RaceTrack>,
        interval: Duration,
        sink: S,
    ) -> Result<ObserverHandle, RaceError> {
        validate_interval(interval)?;
        Ok(Self::spawn(track, interval, sink))
    }

    fn spawn(track: Arc<RaceTrack>, interval: Duration, sink: S) -> ObserverHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let published = Arc::new(AtomicU64::new(0));

        let observer = Self {
            track,
            interval,
            sink,
            shutdown_rx,
            published: Arc::clone(&published),
        };

        debug!(interval_ms = interval.as_millis() as u64, "Starting ranking observer");

        let join = tokio::spawn(async move {
            observer.run().await;
        });

        ObserverHandle {
            shutdown: Some(shutdown_tx),
            join,
            published,
        }
    }

    async fn run(mut self) {
        let started = Instant::now();

        tokio::select! {
            biased;
            _ = &mut self.shutdown_rx => return,
            _ = tokio::time::sleep(OBSERVER_GRACE) => {}
        }

        let mut sequence = 0;
        while !self.track.is_finished() {
            self.sink.publish(LiveRanking {
                sequence,
                elapsed: started.elapsed(),
                finish_distance: self.track.finish_distance(),
                entries: self.track.ranking(),
            });
            sequence += 1;
            self.published.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                biased;
                _ = &mut self.shutdown_rx => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(published = sequence, "Ranking observer stopped");
    }
}

impl ObserverHandle {
    /// Number of rankings published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Whether the observer task has ended on its own.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the observer and wait for it to end.
    ///
    /// Returns the number of rankings published. An observer that does not
    /// end within the bounded wait is aborted.
    pub async fn stop(mut self) -> u64 {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if tokio::time::timeout(STOP_JOIN_TIMEOUT, &mut self.join)
            .await
            .is_err()
        {
            warn!("Ranking observer did not stop in time, aborting");
            self.join.abort();
        }

        self.published()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        if !self.join.is_finished() {
            self.join.abort();
        }
    }
}

/// Check an observer refresh interval.
pub fn validate_interval(interval: Duration) -> Result<(), RaceError> {
    if interval < MIN_OBSERVER_INTERVAL || interval > MAX_OBSERVER_INTERVAL {
        return Err(RaceError::InvalidConfig(format!(
            "observer interval must be within {:?}..={:?}, got {:?}",
            MIN_OBSERVER_INTERVAL, MAX_OBSERVER_INTERVAL, interval
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::tuning::TICK_INTERVAL;
    use derby_types::Species;

    fn open_track() -> Arc<RaceTrack> {
        let (track, _movers) = RaceTrack::builder(50.0, TICK_INTERVAL)
            .with_default_lineup()
            .build();
        track
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "░".repeat(20)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "█".repeat(20)));
        assert_eq!(
            progress_bar(0.5),
            format!("[{}{}]", "█".repeat(10), "░".repeat(10))
        );
    }

    #[test]
    fn test_interval_bounds() {
        assert!(validate_interval(Duration::from_millis(2000)).is_ok());
        assert!(validate_interval(Duration::ZERO).is_err());
        assert!(validate_interval(Duration::from_secs(61)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_after_grace_until_stopped() {
        let track = open_track();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle =
            RankingObserver::start(Arc::clone(&track), Duration::from_millis(2000), tx).unwrap();

        // Nothing during the grace period
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(rx.try_recv().is_err());

        // Grace ends at 1s, then every 2s: 1s, 3s, 5s
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        let published = handle.stop().await;
        assert_eq!(published, 3);

        let mut sequences = Vec::new();
        while let Ok(ranking) = rx.try_recv() {
            assert_eq!(ranking.entries.len(), 3);
            assert_eq!(ranking.finish_distance, 50.0);
            sequences.push(ranking.sequence);
        }
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_race_finishes() {
        let track = open_track();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = RankingObserver::start(Arc::clone(&track), Duration::from_millis(100), tx)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1_250)).await;
        assert!(track.try_declare_winner(&track.participants()[0]));
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(handle.is_finished());
        let published = handle.published();
        assert!(published >= 2);

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, published);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_mutates_race_state() {
        let (track, _movers) = RaceTrack::builder(50.0, TICK_INTERVAL)
            .add("A", Species::Hare)
            .build();
        let before = track.ranking();

        let handle = RankingObserver::start_default(Arc::clone(&track), TracingSink);
        tokio::time::sleep(Duration::from_secs(7)).await;
        handle.stop().await;

        assert_eq!(track.ranking(), before);
        assert!(!track.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_grace_publishes_nothing() {
        let track = open_track();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = RankingObserver::start(track, Duration::from_millis(500), tx).unwrap();

        assert_eq!(handle.stop().await, 0);
    }
}
