//! Monte Carlo slate simulation.
//!
//! Trials run in parallel; every trial gets its own seed from a master
//! generator and every match within a trial its own ChaCha stream, so a
//! slate is reproducible from the master seed regardless of thread count.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::constants::SLATE_PERCENTILES;
use crate::context::Side;
use crate::fantasy::FantasyStats;
use crate::simulator::MatchSimulator;
use crate::surface::Surface;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub player1: String,
    pub player2: String,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub best_of_5: bool,
}

impl Matchup {
    pub fn new(player1: impl Into<String>, player2: impl Into<String>, surface: Surface, best_of_5: bool) -> Self {
        Matchup {
            player1: player1.into(),
            player2: player2.into(),
            surface,
            best_of_5,
        }
    }
}

/// Fantasy point distribution for one player across all trials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerDistribution {
    pub name: String,
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: BTreeMap<usize, f64>,
    pub win_rate: f64,
    pub avg_aces: f64,
    pub avg_breaks: f64,
    pub avg_double_faults: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchupSummary {
    pub player1: String,
    pub player2: String,
    pub surface: Surface,
    pub best_of_5: bool,
    pub p1_win_rate: f64,
    pub avg_sets: f64,
    pub straight_sets_rate: f64,
    pub p1_avg_points: f64,
    pub p2_avg_points: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlateReport {
    pub trials: usize,
    /// Sorted by mean fantasy points, highest first
    pub players: Vec<PlayerDistribution>,
    pub matchups: Vec<MatchupSummary>,
}

impl SlateReport {
    pub fn player(&self, name: &str) -> Option<&PlayerDistribution> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Compact per-match record kept from each trial.
#[derive(Clone, Copy, Debug)]
struct TrialMatch {
    points: [f64; 2],
    stats: [FantasyStats; 2],
    winner: Side,
    sets: u32,
    straight_sets: bool,
}

#[derive(Default)]
struct PlayerSamples {
    points: Vec<f64>,
    wins: u32,
    aces: u64,
    breaks: u64,
    double_faults: u64,
}

impl PlayerSamples {
    fn record(&mut self, points: f64, stats: &FantasyStats) {
        self.points.push(points);
        self.wins += stats.match_won as u32;
        self.aces += stats.aces as u64;
        self.breaks += stats.breaks as u64;
        self.double_faults += stats.double_faults as u64;
    }

    fn into_distribution(self, name: String) -> PlayerDistribution {
        let n = self.points.len();
        let count = n.max(1) as f64;
        let std_dev = if n < 2 { 0.0 } else { self.points.iter().std_dev() };

        let mut data = Data::new(self.points.clone());
        let percentiles = SLATE_PERCENTILES
            .iter()
            .map(|&p| (p, data.percentile(p)))
            .collect();

        PlayerDistribution {
            name,
            samples: n,
            mean: self.points.iter().mean(),
            std_dev,
            min: Statistics::min(self.points.iter()),
            max: Statistics::max(self.points.iter()),
            percentiles,
            win_rate: self.wins as f64 / count,
            avg_aces: self.aces as f64 / count,
            avg_breaks: self.breaks as f64 / count,
            avg_double_faults: self.double_faults as f64 / count,
        }
    }
}

/// Runs a slate of matchups many times and aggregates fantasy outcomes.
#[derive(Clone, Debug)]
pub struct SlateSimulator {
    simulator: MatchSimulator,
    use_variance: bool,
}

impl SlateSimulator {
    pub fn new(simulator: MatchSimulator) -> Self {
        SlateSimulator {
            simulator,
            use_variance: true,
        }
    }

    pub fn with_variance(mut self, use_variance: bool) -> Self {
        self.use_variance = use_variance;
        self
    }

    /// Simulate every matchup `trials` times.
    ///
    /// A player appearing in several matchups contributes one sample per appearance.
    pub fn run(&self, matchups: &[Matchup], trials: usize, seed: Option<u64>) -> SlateReport {
        if trials == 0 || matchups.is_empty() {
            return SlateReport::default();
        }

        let mut master = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let trial_seeds: Vec<u64> = (0..trials).map(|_| master.gen::<u64>()).collect();

        let results: Vec<Vec<TrialMatch>> = trial_seeds
            .par_iter()
            .map(|&trial_seed| self.run_trial(matchups, trial_seed))
            .collect();

        let report = self.aggregate(matchups, &results);
        debug!(trials, matchups = matchups.len(), players = report.players.len(), "slate simulated");
        report
    }

    fn run_trial(&self, matchups: &[Matchup], trial_seed: u64) -> Vec<TrialMatch> {
        matchups
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut rng = ChaCha8Rng::seed_from_u64(trial_seed);
                rng.set_stream(i as u64);
                let result = self.simulator.simulate_match_with_rng(
                    &m.player1,
                    &m.player2,
                    m.surface,
                    m.best_of_5,
                    self.use_variance,
                    &mut rng,
                );
                TrialMatch {
                    points: [
                        result.fantasy_points(Side::Player1, m.best_of_5),
                        result.fantasy_points(Side::Player2, m.best_of_5),
                    ],
                    stats: result.stats,
                    winner: result.winner,
                    sets: result.sets.len() as u32,
                    straight_sets: result.is_straight_sets(),
                }
            })
            .collect()
    }

    fn aggregate(&self, matchups: &[Matchup], results: &[Vec<TrialMatch>]) -> SlateReport {
        let trials = results.len();
        let mut players: HashMap<String, PlayerSamples> = HashMap::new();
        let mut summaries = Vec::with_capacity(matchups.len());

        for (i, m) in matchups.iter().enumerate() {
            let mut p1_wins = 0u32;
            let mut sets = 0u32;
            let mut straight = 0u32;
            let mut totals = [0.0f64; 2];

            for trial in results {
                let record = &trial[i];
                p1_wins += (record.winner == Side::Player1) as u32;
                sets += record.sets;
                straight += record.straight_sets as u32;
                totals[0] += record.points[0];
                totals[1] += record.points[1];

                for (side, name) in [(Side::Player1, &m.player1), (Side::Player2, &m.player2)] {
                    players
                        .entry(name.clone())
                        .or_default()
                        .record(record.points[side.index()], &record.stats[side.index()]);
                }
            }

            let n = trials as f64;
            summaries.push(MatchupSummary {
                player1: m.player1.clone(),
                player2: m.player2.clone(),
                surface: m.surface,
                best_of_5: m.best_of_5,
                p1_win_rate: p1_wins as f64 / n,
                avg_sets: sets as f64 / n,
                straight_sets_rate: straight as f64 / n,
                p1_avg_points: totals[0] / n,
                p2_avg_points: totals[1] / n,
            });
        }

        let mut distributions: Vec<PlayerDistribution> = players
            .into_iter()
            .map(|(name, samples)| samples.into_distribution(name))
            .collect();
        distributions.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.name.cmp(&b.name)));

        SlateReport {
            trials,
            players: distributions,
            matchups: summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{PlayerProfile, StatProfile};
    use crate::store::PlayerProfileStore;
    use std::sync::Arc;

    fn slate_simulator() -> SlateSimulator {
        let ace = PlayerProfile::new(
            "Ace",
            StatProfile {
                ace_rate: 14.0,
                service_points_won: 70.0,
                ..StatProfile::league_average()
            },
        )
        .with_elo(2000.0);
        let store = PlayerProfileStore::new()
            .with_profile(ace)
            .with_profile(PlayerProfile::new("Journeyman", StatProfile::league_average()).with_elo(1600.0));
        SlateSimulator::new(MatchSimulator::with_store(Arc::new(store)).unwrap())
    }

    fn matchups() -> Vec<Matchup> {
        vec![
            Matchup::new("Ace", "Journeyman", Surface::Grass, false),
            Matchup::new("Qualifier A", "Qualifier B", Surface::Clay, true),
        ]
    }

    #[test]
    fn test_report_is_reproducible() {
        let sim = slate_simulator();
        let a = sim.run(&matchups(), 100, Some(17));
        let b = sim.run(&matchups(), 100, Some(17));
        assert_eq!(a, b);
        assert_eq!(a.trials, 100);
    }

    #[test]
    fn test_distributions_are_consistent() {
        let report = slate_simulator().run(&matchups(), 300, Some(3));
        assert_eq!(report.players.len(), 4);
        assert_eq!(report.matchups.len(), 2);

        for player in &report.players {
            assert_eq!(player.samples, 300);
            assert!(player.min <= player.mean && player.mean <= player.max);
            assert!((0.0..=1.0).contains(&player.win_rate));
            let values: Vec<f64> = player.percentiles.values().copied().collect();
            assert_eq!(values.len(), SLATE_PERCENTILES.len());
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
        }

        // Win rates of opponents sum to one
        let ace = report.player("Ace").unwrap();
        let journeyman = report.player("Journeyman").unwrap();
        assert!((ace.win_rate + journeyman.win_rate - 1.0).abs() < 1e-9);
        assert!(ace.win_rate > 0.5);
        assert!(ace.avg_aces > journeyman.avg_aces);
        assert!(report.player("Nobody").is_none());

        // Sorted by mean, highest first
        assert!(report.players.windows(2).all(|w| w[0].mean >= w[1].mean));
    }

    #[test]
    fn test_matchup_summary() {
        let report = slate_simulator().run(&matchups(), 200, Some(8));
        let bo3 = &report.matchups[0];
        assert!(bo3.avg_sets >= 2.0 && bo3.avg_sets <= 3.0);
        let bo5 = &report.matchups[1];
        assert!(bo5.avg_sets >= 3.0 && bo5.avg_sets <= 5.0);
        assert!((0.0..=1.0).contains(&bo5.straight_sets_rate));
        assert!((bo3.p1_avg_points - report.player("Ace").unwrap().mean).abs() < 1e-6);
    }

    #[test]
    fn test_empty_slate() {
        let sim = slate_simulator();
        assert_eq!(sim.run(&[], 100, Some(1)), SlateReport::default());
        assert_eq!(sim.run(&matchups(), 0, Some(1)).players.len(), 0);
    }

    #[test]
    fn test_report_serializes() {
        let report = slate_simulator().run(&matchups(), 20, Some(5));
        let json = report.to_json().unwrap();
        let decoded: SlateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.players.len(), report.players.len());
    }
}
