use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{MatchContext, Side};
use crate::fantasy::FantasyStats;
use crate::point::{tiebreak_pressure, GameSituation, PointEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakResult {
    pub winner: Side,
    /// Points won, indexed by side
    pub points: [u32; 2],
    pub first_server: Side,
}

impl TiebreakResult {
    pub fn points_played(&self) -> u32 {
        self.points[0] + self.points[1]
    }

    pub fn loser_points(&self) -> u32 {
        self.points[self.winner.other().index()]
    }
}

/// Server of the `n`th tiebreak point (0-based): one point, then alternating pairs.
pub fn tiebreak_server(first_server: Side, n: u32) -> Side {
    if ((n + 1) / 2) % 2 == 0 {
        first_server
    } else {
        first_server.other()
    }
}

/// Play a tiebreak: first to seven points, ahead by two.
pub fn play_tiebreak<R: Rng>(
    engine: &PointEngine,
    ctx: &MatchContext,
    first_server: Side,
    situation: &GameSituation,
    stats: &mut [FantasyStats; 2],
    rng: &mut R,
) -> TiebreakResult {
    let mut points = [0u32; 2];

    let winner = loop {
        let server = tiebreak_server(first_server, points[0] + points[1]);
        let pressure = tiebreak_pressure(points, situation);
        let outcome = engine.play_point(ctx, server, situation.current_set, pressure, rng);

        if outcome.ace {
            stats[server.index()].add_ace();
        }
        if outcome.double_fault {
            stats[server.index()].add_double_fault();
        }
        let point_winner = if outcome.server_won() { server } else { server.other() };
        points[point_winner.index()] += 1;

        let (own, opp) = (points[point_winner.index()], points[point_winner.other().index()]);
        if own >= 7 && own >= opp + 2 {
            break point_winner;
        }
    };

    TiebreakResult {
        winner,
        points,
        first_server,
    }
}
