//! Tournament reports.

use crate::statistics::{ParticipantStats, RaceStatistics};
use derby_parallel::RaceOutcome;
use derby_types::ParticipantSnapshot;
use std::time::Duration;

/// Result of one round.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    /// 1-based round number.
    pub round: usize,
    /// Name of the round's winner.
    pub winner: String,
    /// Final ranking, best first.
    pub ranking: Vec<ParticipantSnapshot>,
    /// Race time from start to completion.
    pub elapsed: Duration,
    /// Seed the round was run with.
    pub seed: u64,
    /// Non-fatal warnings raised while stopping.
    pub warnings: Vec<String>,
}

impl RoundSummary {
    pub fn from_outcome(round: usize, outcome: RaceOutcome) -> Self {
        let warnings = outcome.warnings();
        Self {
            round,
            winner: outcome.winner.name,
            ranking: outcome.ranking,
            elapsed: outcome.elapsed,
            seed: outcome.seed,
            warnings,
        }
    }
}

/// Final report of a tournament.
#[derive(Debug, Clone)]
pub struct TournamentReport {
    summaries: Vec<RoundSummary>,
    statistics: RaceStatistics,
    wall_duration: Duration,
}

impl TournamentReport {
    pub fn new(
        summaries: Vec<RoundSummary>,
        statistics: RaceStatistics,
        wall_duration: Duration,
    ) -> Self {
        Self {
            summaries,
            statistics,
            wall_duration,
        }
    }

    /// Number of rounds played.
    pub fn rounds(&self) -> usize {
        self.summaries.len()
    }

    /// Per-round summaries in round order.
    pub fn summaries(&self) -> &[RoundSummary] {
        &self.summaries
    }

    pub fn statistics(&self) -> &RaceStatistics {
        &self.statistics
    }

    /// Participant with the most wins.
    pub fn champion(&self) -> Option<&ParticipantStats> {
        self.statistics.champion()
    }

    /// Wall-clock time of the whole tournament.
    pub fn wall_duration(&self) -> Duration {
        self.wall_duration
    }

    /// Warnings from every round, prefixed with the round number.
    pub fn warnings(&self) -> Vec<String> {
        self.summaries
            .iter()
            .flat_map(|s| s.warnings.iter().map(move |w| format!("round {}: {}", s.round, w)))
            .collect()
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════");
        println!("            TOURNAMENT REPORT              ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Rounds:");
        for summary in &self.summaries {
            println!(
                "  {:>3}. {:<12} {:>7.2}s  (seed {})",
                summary.round,
                summary.winner,
                summary.elapsed.as_secs_f64(),
                summary.seed
            );
        }
        println!();
        println!("Standings:");
        for (place, stats) in self.statistics.standings_by_wins().iter().enumerate() {
            println!(
                "  {}. {:<12} wins {:>3} ({:>5.1}%)  2nd {:>3}  3rd {:>3}",
                place + 1,
                stats.name,
                stats.wins,
                stats.win_rate(),
                stats.second_places,
                stats.third_places
            );
        }
        println!();
        println!("Details:");
        for stats in self.statistics.participants() {
            println!(
                "  {:<12} avg speed {:>5.2} km/h  avg rank {:.2}  distance {:.1}",
                stats.name,
                stats.average_speed(),
                stats.average_rank(),
                stats.total_distance
            );
        }
        println!();
        if let Some(fastest) = self.statistics.fastest_average() {
            println!(
                "Fastest average:  {} ({:.2} km/h)",
                fastest.name,
                fastest.average_speed()
            );
        }
        if let Some(steady) = self.statistics.most_consistent() {
            println!(
                "Most consistent:  {} (rank variance {:.2})",
                steady.name,
                steady.rank_variance()
            );
        }
        println!("Total distance:   {:.1}", self.statistics.total_distance());

        let warnings = self.warnings();
        if !warnings.is_empty() {
            println!();
            println!("Warnings:");
            for warning in &warnings {
                println!("  {}", warning);
            }
        }

        println!();
        println!("Duration: {:.2}s", self.wall_duration.as_secs_f64());
        if let Some(champion) = self.champion() {
            println!("Champion: {} ({} wins)", champion.name, champion.wins);
        }
        println!("═══════════════════════════════════════════\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::{ParticipantId, Species};

    fn entry(name: &str, position: f64) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: ParticipantId(0),
            name: name.to_string(),
            species: Species::Hare,
            position,
            base_speed: 9.0,
            current_speed: 9.0,
            finished: position >= 50.0,
            ticks: 10,
        }
    }

    fn summary(round: usize, winner: &str, warnings: Vec<String>) -> RoundSummary {
        RoundSummary {
            round,
            winner: winner.to_string(),
            ranking: vec![entry(winner, 50.0)],
            elapsed: Duration::from_secs(12),
            seed: round as u64,
            warnings,
        }
    }

    #[test]
    fn test_report_accessors() {
        let mut statistics = RaceStatistics::new();
        statistics.record_round(&[entry("A", 50.0), entry("B", 30.0)]);
        statistics.record_round(&[entry("A", 50.0), entry("B", 45.0)]);

        let report = TournamentReport::new(
            vec![summary(1, "A", vec![]), summary(2, "A", vec!["late".to_string()])],
            statistics,
            Duration::from_secs(30),
        );

        assert_eq!(report.rounds(), 2);
        assert_eq!(report.champion().map(|c| c.name.as_str()), Some("A"));
        assert_eq!(report.warnings(), vec!["round 2: late".to_string()]);
        assert_eq!(report.statistics().total_distance(), 175.0);
        report.print_summary();
    }

    #[test]
    fn test_empty_report_prints() {
        let report = TournamentReport::new(vec![], RaceStatistics::new(), Duration::ZERO);
        assert_eq!(report.rounds(), 0);
        assert!(report.champion().is_none());
        report.print_summary();
    }
}
