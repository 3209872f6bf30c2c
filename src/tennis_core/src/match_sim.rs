use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::constants::MINUTES_PER_GAME;
use crate::context::{MatchContext, Side};
use crate::fantasy::{fantasy_points, FantasyStats};
use crate::point::PointEngine;
use crate::set::{play_set, SetResult};

/// Complete record of one simulated match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Fantasy stats, indexed by side
    pub stats: [FantasyStats; 2],
    pub sets: Vec<SetResult>,
    pub winner: Side,
    pub first_server: Side,
    pub total_points: u32,
    pub best_of_5: bool,
}

impl MatchResult {
    pub fn stats(&self, side: Side) -> &FantasyStats {
        &self.stats[side.index()]
    }

    pub fn total_games(&self) -> u32 {
        self.sets.iter().map(|s| s.games[0] + s.games[1]).sum()
    }

    pub fn is_straight_sets(&self) -> bool {
        self.sets.iter().all(|s| s.winner == self.winner)
    }

    /// Set scores from player 1's perspective, e.g. `6-4 6-7(5) 7-6(3)`.
    ///
    /// Tiebreak sets show the loser's tiebreak points in parentheses.
    pub fn score_line(&self) -> String {
        let mut line = String::new();
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            let _ = write!(line, "{}-{}", set.games[0], set.games[1]);
            if let Some(tb) = &set.tiebreak {
                let _ = write!(line, "({})", tb.loser_points());
            }
        }
        line
    }

    pub fn estimated_duration_minutes(&self) -> f64 {
        self.total_games() as f64 * MINUTES_PER_GAME
    }

    pub fn fantasy_points(&self, side: Side, best_of_5: bool) -> f64 {
        fantasy_points(self.stats(side), best_of_5)
    }
}

/// Plays whole matches: sets until one side reaches the required count.
#[derive(Clone, Debug)]
pub struct MatchEngine {
    points: PointEngine,
}

impl MatchEngine {
    pub fn new(points: PointEngine) -> Self {
        MatchEngine { points }
    }

    pub fn point_engine(&self) -> &PointEngine {
        &self.points
    }

    pub fn play<R: Rng>(&self, ctx: &MatchContext, rng: &mut R) -> MatchResult {
        let first_server = if rng.gen_bool(0.5) {
            Side::Player1
        } else {
            Side::Player2
        };
        let sets_to_win = ctx.sets_to_win();

        let mut stats = [FantasyStats::default(); 2];
        let mut sets_won = [0u32; 2];
        let mut sets = Vec::with_capacity(if ctx.best_of_5 { 5 } else { 3 });
        let mut server = first_server;

        let winner = loop {
            let set_number = sets.len() as u32 + 1;
            let set = play_set(&self.points, ctx, server, set_number, sets_won, &mut stats, rng);
            sets_won[set.winner.index()] += 1;
            server = set.next_server;
            let set_winner = set.winner;
            sets.push(set);

            if sets_won[set_winner.index()] >= sets_to_win {
                break set_winner;
            }
        };

        stats[winner.index()].finalize_match(true);
        stats[winner.other().index()].finalize_match(false);
        let total_points = sets.iter().map(|s| s.points_played).sum();

        MatchResult {
            stats,
            sets,
            winner,
            first_server,
            total_points,
            best_of_5: ctx.best_of_5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::point::tests::average_context;
    use crate::surface::Surface;
    use crate::tiebreak::TiebreakResult;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> MatchEngine {
        MatchEngine::new(PointEngine::new(&SimulationConfig::default()).unwrap())
    }

    fn set(winner: Side, games: [u32; 2], tiebreak: Option<[u32; 2]>) -> SetResult {
        SetResult {
            winner,
            games,
            tiebreak: tiebreak.map(|points| TiebreakResult {
                winner,
                points,
                first_server: Side::Player1,
            }),
            first_server: Side::Player1,
            next_server: Side::Player2,
            points_played: 0,
        }
    }

    #[test]
    fn test_score_line_and_duration() {
        let result = MatchResult {
            stats: [FantasyStats::default(); 2],
            sets: vec![
                set(Side::Player1, [6, 4], None),
                set(Side::Player2, [6, 7], Some([5, 7])),
                set(Side::Player1, [7, 6], Some([10, 8])),
            ],
            winner: Side::Player1,
            first_server: Side::Player1,
            total_points: 0,
            best_of_5: false,
        };
        assert_eq!(result.score_line(), "6-4 6-7(5) 7-6(8)");
        assert_eq!(result.total_games(), 36);
        assert!((result.estimated_duration_minutes() - 306.0).abs() < 1e-9);
        assert!(!result.is_straight_sets());
    }

    #[test]
    fn test_match_stats_agree_with_sets() {
        let engine = engine();
        let ctx = average_context(Surface::Hard);
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..200 {
            let result = engine.play(&ctx, &mut rng);
            let winner = result.stats(result.winner);
            let loser = result.stats(result.winner.other());
            assert!(winner.match_won && !loser.match_won);
            assert_eq!(winner.sets_won, 2);
            assert_eq!(winner.straight_sets, result.is_straight_sets());
            assert_eq!(winner.games_won + loser.games_won, result.total_games());
            assert_eq!(winner.no_double_faults, winner.double_faults == 0);
            assert!(result.total_points >= result.total_games() * 4);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_match_terminates(seed in any::<u64>(), best_of_5 in any::<bool>()) {
            let engine = engine();
            let mut ctx = average_context(Surface::Grass);
            ctx.best_of_5 = best_of_5;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = engine.play(&ctx, &mut rng);

            let needed = if best_of_5 { 3 } else { 2 };
            prop_assert_eq!(result.stats(result.winner).sets_won, needed);
            prop_assert!(result.stats(result.winner.other()).sets_won < needed);
            prop_assert!(result.sets.len() as u32 <= 2 * needed - 1);
            prop_assert_eq!(result.sets.last().map(|s| s.winner), Some(result.winner));
            for pair in result.sets.windows(2) {
                prop_assert_eq!(pair[1].first_server, pair[0].next_server);
            }
        }
    }
}
