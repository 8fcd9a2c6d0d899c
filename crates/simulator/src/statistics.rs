//! Cross-round statistics.

use derby_types::ParticipantSnapshot;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from statistics queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("No statistics recorded for participant '{0}'")]
    UnknownParticipant(String),
}

/// Cumulative results of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantStats {
    pub name: String,
    pub wins: u32,
    pub second_places: u32,
    pub third_places: u32,
    /// Sum of final positions over all rounds.
    pub total_distance: f64,
    /// Base speed per round, in round order.
    pub speeds: Vec<f64>,
    /// Finishing rank per round (1-based), in round order.
    pub ranks: Vec<usize>,
}

impl ParticipantStats {
    fn new(name: String) -> Self {
        Self {
            name,
            wins: 0,
            second_places: 0,
            third_places: 0,
            total_distance: 0.0,
            speeds: Vec::new(),
            ranks: Vec::new(),
        }
    }

    fn record(&mut self, rank: usize, distance: f64, speed: f64) {
        match rank {
            1 => self.wins += 1,
            2 => self.second_places += 1,
            3 => self.third_places += 1,
            _ => {}
        }
        self.total_distance += distance;
        self.speeds.push(speed);
        self.ranks.push(rank);
    }

    /// Number of rounds this participant raced.
    pub fn races(&self) -> usize {
        self.speeds.len()
    }

    /// Percentage of rounds won.
    pub fn win_rate(&self) -> f64 {
        match self.races() {
            0 => 0.0,
            n => self.wins as f64 / n as f64 * 100.0,
        }
    }

    /// Mean recorded speed.
    pub fn average_speed(&self) -> f64 {
        mean(self.speeds.iter().copied())
    }

    /// Mean finishing rank.
    pub fn average_rank(&self) -> f64 {
        mean(self.ranks.iter().map(|&r| r as f64))
    }

    /// Population variance of the finishing rank.
    pub fn rank_variance(&self) -> f64 {
        if self.ranks.is_empty() {
            return 0.0;
        }
        let avg = self.average_rank();
        mean(self.ranks.iter().map(|&r| (r as f64 - avg).powi(2)))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Statistics aggregated over the rounds of a tournament.
///
/// Participants are kept in the order they were first seen, which is the
/// order ties are reported in.
#[derive(Debug, Clone, Default)]
pub struct RaceStatistics {
    entries: Vec<ParticipantStats>,
    index: HashMap<String, usize>,
    rounds: usize,
}

impl RaceStatistics {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one round's final ranking (best first) into the statistics.
    pub fn record_round(&mut self, ranking: &[ParticipantSnapshot]) {
        self.rounds += 1;
        for (i, entry) in ranking.iter().enumerate() {
            let slot = match self.index.get(&entry.name) {
                Some(&slot) => slot,
                None => {
                    self.entries.push(ParticipantStats::new(entry.name.clone()));
                    self.index.insert(entry.name.clone(), self.entries.len() - 1);
                    self.entries.len() - 1
                }
            };
            self.entries[slot].record(i + 1, entry.position, entry.base_speed);
        }
    }

    /// Number of rounds recorded.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statistics for one participant.
    pub fn stats(&self, name: &str) -> Result<&ParticipantStats, StatsError> {
        self.index
            .get(name)
            .map(|&slot| &self.entries[slot])
            .ok_or_else(|| StatsError::UnknownParticipant(name.to_string()))
    }

    /// All participants in first-seen order.
    pub fn participants(&self) -> &[ParticipantStats] {
        &self.entries
    }

    /// Participants by descending win count; ties keep first-seen order.
    pub fn standings_by_wins(&self) -> Vec<&ParticipantStats> {
        let mut standings: Vec<&ParticipantStats> = self.entries.iter().collect();
        standings.sort_by(|a, b| b.wins.cmp(&a.wins));
        standings
    }

    /// The participant at the top of the standings.
    pub fn champion(&self) -> Option<&ParticipantStats> {
        self.standings_by_wins().into_iter().next()
    }

    /// The participant with the highest average recorded speed.
    pub fn fastest_average(&self) -> Option<&ParticipantStats> {
        self.entries.iter().reduce(|best, candidate| {
            if candidate.average_speed() > best.average_speed() {
                candidate
            } else {
                best
            }
        })
    }

    /// The participant with the lowest variance of finishing rank.
    pub fn most_consistent(&self) -> Option<&ParticipantStats> {
        self.entries
            .iter()
            .min_by(|a, b| a.rank_variance().total_cmp(&b.rank_variance()))
    }

    /// Distance covered by all participants over all rounds.
    pub fn total_distance(&self) -> f64 {
        self.entries.iter().map(|s| s.total_distance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use derby_types::{ParticipantId, Species};

    fn entry(name: &str, position: f64, base_speed: f64) -> ParticipantSnapshot {
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

    #[test]
    fn test_record_round_counts_places() {
        let mut stats = RaceStatistics::new();
        stats.record_round(&[
            entry("A", 50.0, 9.0),
            entry("B", 40.0, 8.0),
            entry("C", 30.0, 7.0),
            entry("D", 20.0, 6.0),
        ]);

        assert_eq!(stats.rounds(), 1);
        assert_eq!(stats.stats("A").unwrap().wins, 1);
        assert_eq!(stats.stats("B").unwrap().second_places, 1);
        assert_eq!(stats.stats("C").unwrap().third_places, 1);

        let d = stats.stats("D").unwrap();
        assert_eq!(d.wins + d.second_places + d.third_places, 0);
        assert_eq!(d.ranks, vec![4]);
        assert_eq!(d.speeds, vec![6.0]);
        assert_eq!(stats.total_distance(), 140.0);
    }

    #[test]
    fn test_derived_values() {
        let mut stats = RaceStatistics::new();
        stats.record_round(&[entry("A", 50.0, 8.0), entry("B", 45.0, 10.0)]);
        stats.record_round(&[entry("B", 50.0, 6.0), entry("A", 49.0, 9.0)]);

        let a = stats.stats("A").unwrap();
        assert_eq!(a.races(), 2);
        assert_eq!(a.win_rate(), 50.0);
        assert_eq!(a.average_rank(), 1.5);
        assert_eq!(a.rank_variance(), 0.25);
        assert_eq!(a.average_speed(), 8.5);
        assert_eq!(a.total_distance, 99.0);

        // A averages 8.5, B averages 8.0
        assert_eq!(stats.fastest_average().unwrap().name, "A");
    }

    #[test]
    fn test_most_consistent_uses_rank_variance() {
        let mut stats = RaceStatistics::new();
        stats.record_round(&[entry("A", 50.0, 8.0), entry("B", 40.0, 8.0), entry("C", 30.0, 8.0)]);
        stats.record_round(&[entry("C", 50.0, 8.0), entry("B", 40.0, 8.0), entry("A", 30.0, 8.0)]);

        // B is second both times
        assert_eq!(stats.most_consistent().unwrap().name, "B");
    }

    #[test]
    fn test_unknown_participant() {
        let mut stats = RaceStatistics::new();
        assert_eq!(
            stats.stats("Nobody"),
            Err(StatsError::UnknownParticipant("Nobody".to_string()))
        );

        stats.record_round(&[entry("A", 50.0, 8.0)]);
        assert!(stats.stats("A").is_ok());
        assert!(matches!(
            stats.stats("a"),
            Err(StatsError::UnknownParticipant(name)) if name == "a"
        ));
    }

    #[test]
    fn test_empty_statistics() {
        let stats = RaceStatistics::new();
        assert!(stats.is_empty());
        assert!(stats.champion().is_none());
        assert!(stats.fastest_average().is_none());
        assert!(stats.most_consistent().is_none());
        assert_eq!(stats.total_distance(), 0.0);
    }
}
