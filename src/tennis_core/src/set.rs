use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::{MatchContext, Side};
use crate::fantasy::FantasyStats;
use crate::game::play_game;
use crate::point::{GameSituation, PointEngine};
use crate::tiebreak::{play_tiebreak, TiebreakResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResult {
    pub winner: Side,
    /// Games won, indexed by side
    pub games: [u32; 2],
    pub tiebreak: Option<TiebreakResult>,
    pub first_server: Side,
    /// Player who serves first in the following set
    pub next_server: Side,
    pub points_played: u32,
}

impl SetResult {
    pub fn loser_games(&self) -> u32 {
        self.games[self.winner.other().index()]
    }
}

/// Side that wins the set by winning the next game, if any.
fn set_point_for(games: [u32; 2]) -> Option<Side> {
    [Side::Player1, Side::Player2].into_iter().find(|side| {
        let own = games[side.index()] + 1;
        let opp = games[side.other().index()];
        own >= 6 && own >= opp + 2
    })
}

/// Play a set: six games ahead by two, with a tiebreak at six-all.
///
/// `sets_won` is the match score before this set, used to tag match points.
pub fn play_set<R: Rng>(
    engine: &PointEngine,
    ctx: &MatchContext,
    first_server: Side,
    set_number: u32,
    sets_won: [u32; 2],
    stats: &mut [FantasyStats; 2],
    rng: &mut R,
) -> SetResult {
    let sets_to_win = ctx.sets_to_win();
    let set_decides_match = [sets_won[0] + 1 >= sets_to_win, sets_won[1] + 1 >= sets_to_win];

    let mut games = [0u32; 2];
    let mut server = first_server;
    let mut points_played = 0;

    let (winner, tiebreak, next_server) = loop {
        let situation = GameSituation {
            current_set: set_number,
            set_point_for: set_point_for(games),
            set_decides_match,
        };

        if games == [6, 6] {
            let tb = play_tiebreak(engine, ctx, server, &situation, stats, rng);
            points_played += tb.points_played();
            games[tb.winner.index()] += 1;
            stats[tb.winner.index()].add_game_won();
            stats[tb.winner.other().index()].add_game_lost();
            break (tb.winner, Some(tb), tb.first_server.other());
        }

        let game = play_game(engine, ctx, server, &situation, stats, rng);
        points_played += game.points_played;
        games[game.winner.index()] += 1;

        let (own, opp) = (games[game.winner.index()], games[game.winner.other().index()]);
        if own >= 6 && own >= opp + 2 {
            break (game.winner, None, server.other());
        }
        server = server.other();
    };

    stats[winner.index()].add_set_won(games[winner.other().index()]);
    stats[winner.other().index()].add_set_lost();
    trace!(set = set_number, ?winner, p1_games = games[0], p2_games = games[1], "set complete");

    SetResult {
        winner,
        games,
        tiebreak,
        first_server,
        next_server,
        points_played,
    }
}
