//! Tournament runner.
//!
//! Runs the race orchestrator for a fixed number of rounds, strictly one
//! after another, and folds every round's final ranking into
//! [`RaceStatistics`].

use crate::config::TournamentConfig;
use crate::report::{RoundSummary, TournamentReport};
use crate::statistics::RaceStatistics;
use derby_core::RaceTrack;
use derby_parallel::{
    LiveRanking, ObserverHandle, Race, RaceError, RaceOutcome, RankingObserver, TracingSink,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Errors from tournament orchestration.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),
    #[error("Round {round} failed: {source}")]
    Race {
        round: usize,
        #[source]
        source: RaceError,
    },
}

/// Runs rounds and aggregates their results.
pub struct Tournament {
    config: TournamentConfig,
    statistics: RaceStatistics,
    summaries: Vec<RoundSummary>,
    /// Optional channel for live rankings; logs through `tracing` otherwise.
    live_rankings: Option<mpsc::UnboundedSender<LiveRanking>>,
}

impl Tournament {
    /// Create a tournament. The configuration is validated before any round.
    pub fn new(config: TournamentConfig) -> Result<Self, TournamentError> {
        config.validate().map_err(TournamentError::InvalidConfig)?;

        info!(
            rounds = config.rounds,
            participants = config.race.num_participants(),
            use_observer = config.use_observer,
            "Tournament created"
        );

        Ok(Self {
            config,
            statistics: RaceStatistics::new(),
            summaries: Vec::new(),
            live_rankings: None,
        })
    }

    /// Send live rankings to `tx` instead of the log.
    ///
    /// Only used when the observer is enabled.
    pub fn with_live_rankings(mut self, tx: mpsc::UnboundedSender<LiveRanking>) -> Self {
        self.live_rankings = Some(tx);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Statistics recorded so far.
    pub fn statistics(&self) -> &RaceStatistics {
        &self.statistics
    }

    /// Summaries of the rounds played so far.
    pub fn rounds_played(&self) -> &[RoundSummary] {
        &self.summaries
    }

    /// Run every round and return the final report.
    pub async fn run(mut self) -> Result<TournamentReport, TournamentError> {
        let started = Instant::now();
        let total = self.config.rounds;

        for round in 1..=total {
            let summary = self.run_round(round).await?;
            self.summaries.push(summary);

            if round < total {
                self.log_standings(round);
                if !self.config.inter_round_pause.is_zero() {
                    tokio::time::sleep(self.config.inter_round_pause).await;
                }
            }
        }

        let report = TournamentReport::new(self.summaries, self.statistics, started.elapsed());

        info!(
            rounds = report.rounds(),
            champion = report.champion().map(|c| c.name.as_str()).unwrap_or("-"),
            "Tournament complete"
        );

        Ok(report)
    }

    /// Run a single round (1-based) and record its result.
    pub async fn run_round(&mut self, round: usize) -> Result<RoundSummary, TournamentError> {
        let race_err = |source: RaceError| TournamentError::Race { round, source };

        let mut race = Race::new(self.config.race_for_round(round)).map_err(race_err)?;
        let track = race.initialize().map_err(race_err)?;

        info!(round, total = self.config.rounds, seed = race.seed(), "Round starting");
        race.start().map_err(race_err)?;

        let observer = if self.config.use_observer {
            Some(self.start_observer(&track).map_err(race_err)?)
        } else {
            None
        };

        let result = race.monitor().await;

        if let Some(observer) = observer {
            observer.stop().await;
        }

        let outcome = result.map_err(race_err)?;
        for warning in outcome.warnings() {
            warn!(round, "{}", warning);
        }

        self.record(&outcome);
        Ok(RoundSummary::from_outcome(round, outcome))
    }

    fn start_observer(&self, track: &Arc<RaceTrack>) -> Result<ObserverHandle, RaceError> {
        let interval = self.config.observer_interval;
        match &self.live_rankings {
            Some(tx) => RankingObserver::start(Arc::clone(track), interval, tx.clone()),
            None => RankingObserver::start(Arc::clone(track), interval, TracingSink),
        }
    }

    fn record(&mut self, outcome: &RaceOutcome) {
        self.statistics.record_round(&outcome.ranking);
    }

    fn log_standings(&self, round: usize) {
        for (place, stats) in self.statistics.standings_by_wins().iter().enumerate() {
            info!(
                after_round = round,
                place = place + 1,
                participant = %stats.name,
                wins = stats.wins,
                win_rate = format!("{:.1}", stats.win_rate()),
                "Interim standings"
            );
        }
    }
}
