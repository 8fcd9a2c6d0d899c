//! End-to-end tests for races and tournaments.
//!
//! All async tests run on a paused tokio clock, so a race that takes twenty
//! seconds of race time finishes immediately.

use derby_parallel::{Entrant, Race, RaceConfig, RacePhase};
use derby_simulator::{RaceStatistics, StatsError, Tournament, TournamentConfig, TournamentError};
use derby_types::{ParticipantId, ParticipantSnapshot, Species};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn snapshot(name: &str, position: f64, base_speed: f64) -> ParticipantSnapshot {
    ParticipantSnapshot {
        id: ParticipantId(0),
        name: name.to_string(),
        species: Species::Horse,
        position,
        base_speed,
        current_speed: base_speed,
        finished: position >= 50.0,
        ticks: 0,
    }
}

// ============================================================================
// Single race
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_default_race_finishes_within_thirty_seconds() {
    init_tracing();

    let start = tokio::time::Instant::now();
    let outcome = Race::new(RaceConfig::default()).unwrap().run().await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(outcome.ranking.len(), 3);
    assert_eq!(outcome.ranking[0].id, outcome.winner.id);
    assert_eq!(outcome.winner.position, 50.0);
    assert!(outcome.winner.finished);
    assert!(outcome.stop_report.is_clean());
    for entry in &outcome.ranking {
        assert!(entry.position <= 50.0);
    }

    info!(winner = %outcome.winner.name, "Race finished");
}

#[tokio::test(start_paused = true)]
async fn test_race_lifecycle_exposes_single_winner() {
    init_tracing();

    let config = RaceConfig::new()
        .with_finish_distance(10.0)
        .with_seed(7)
        .with_lineup(vec![
            Entrant::new("Shelly", Species::Tortoise),
            Entrant::new("Bolt", Species::Hare),
            Entrant::new("Comet", Species::Horse),
            Entrant::new("Dasher", Species::Hare),
        ]);

    let mut race = Race::new(config).unwrap();
    let track = race.initialize().unwrap();
    race.start().unwrap();
    let outcome = race.monitor().await.unwrap();

    assert_eq!(race.phase(), RacePhase::Completed);
    assert!(track.is_finished());
    assert_eq!(race.winner().map(|w| w.name), Some(outcome.winner.name.clone()));

    let crossed = outcome
        .ranking
        .iter()
        .filter(|s| s.position == track.finish_distance())
        .count();
    assert!(crossed >= 1);
    assert_eq!(race.final_ranking().unwrap(), outcome.ranking);
}

// ============================================================================
// Tournament
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_five_round_tournament_records_every_round() {
    init_tracing();

    let config = TournamentConfig::new(5, false)
        .with_inter_round_pause(Duration::from_millis(250))
        .with_race(RaceConfig::new().with_seed(21));
    let report = Tournament::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.rounds(), 5);
    let stats = report.statistics();
    assert_eq!(stats.rounds(), 5);

    for entry in stats.participants() {
        assert_eq!(entry.speeds.len(), 5, "{}", entry.name);
        assert_eq!(entry.ranks.len(), 5, "{}", entry.name);
    }

    // Each round awards exactly one of each place
    let wins: u32 = stats.participants().iter().map(|s| s.wins).sum();
    let seconds: u32 = stats.participants().iter().map(|s| s.second_places).sum();
    let thirds: u32 = stats.participants().iter().map(|s| s.third_places).sum();
    assert_eq!((wins, seconds, thirds), (5, 5, 5));

    // Every round has a winner at the line, so at least 5 * 50 was covered
    assert!(stats.total_distance() >= 250.0);
    assert!(stats.total_distance() <= 750.0);

    for summary in report.summaries() {
        assert_eq!(summary.ranking[0].name, summary.winner);
        assert!(summary.warnings.is_empty());
    }

    assert!(report.champion().is_some());
    report.print_summary();
}

#[tokio::test(start_paused = true)]
async fn test_tournament_with_observer_channel() {
    init_tracing();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = TournamentConfig::new(2, true)
        .with_observer_interval(Duration::from_millis(500))
        .with_race(RaceConfig::new().with_seed(5));

    let report = Tournament::new(config)
        .unwrap()
        .with_live_rankings(tx)
        .run()
        .await
        .unwrap();
    assert_eq!(report.rounds(), 2);

    let mut received = Vec::new();
    while let Ok(ranking) = rx.try_recv() {
        received.push(ranking);
    }

    assert!(!received.is_empty());
    for ranking in &received {
        assert_eq!(ranking.entries.len(), 3);
        assert!(ranking
            .entries
            .windows(2)
            .all(|w| w[0].position >= w[1].position));
    }
}

#[tokio::test]
async fn test_tournament_rejects_bad_config_before_running() {
    init_tracing();

    let result = Tournament::new(TournamentConfig::new(101, false));
    assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));

    let duplicate = RaceConfig::new().with_lineup(vec![
        Entrant::new("Twin", Species::Hare),
        Entrant::new("Twin", Species::Horse),
    ]);
    let result = Tournament::new(TournamentConfig::new(2, false).with_race(duplicate));
    assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));

    let result = Tournament::new(
        TournamentConfig::new(2, true).with_observer_interval(Duration::from_millis(1)),
    );
    assert!(matches!(result, Err(TournamentError::InvalidConfig(_))));
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_standings_follow_win_counts() {
    let mut stats = RaceStatistics::new();
    for _ in 0..3 {
        stats.record_round(&[
            snapshot("A", 50.0, 9.0),
            snapshot("B", 45.0, 8.0),
            snapshot("C", 40.0, 7.0),
        ]);
    }
    for _ in 0..2 {
        stats.record_round(&[
            snapshot("B", 50.0, 8.0),
            snapshot("A", 48.0, 9.0),
            snapshot("C", 40.0, 7.0),
        ]);
    }

    let names: Vec<&str> = stats
        .standings_by_wins()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    assert_eq!(stats.stats("A").unwrap().wins, 3);
    assert_eq!(stats.stats("B").unwrap().wins, 2);
    assert_eq!(stats.stats("C").unwrap().wins, 0);
    assert_eq!(stats.stats("C").unwrap().third_places, 5);
    assert_eq!(stats.champion().map(|c| c.name.as_str()), Some("A"));
}

#[test]
fn test_unknown_participant_is_reported() {
    let mut stats = RaceStatistics::new();
    stats.record_round(&[snapshot("A", 50.0, 9.0), snapshot("B", 40.0, 8.0)]);

    assert_eq!(
        stats.stats("Nobody").err(),
        Some(StatsError::UnknownParticipant("Nobody".to_string()))
    );
}
