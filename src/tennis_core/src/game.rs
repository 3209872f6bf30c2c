use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{MatchContext, Side};
use crate::fantasy::FantasyStats;
use crate::point::{pressure_situation, GameSituation, PointEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub server: Side,
    pub winner: Side,
    pub server_points: u32,
    pub returner_points: u32,
    pub points_played: u32,
    pub aces: u32,
    pub double_faults: u32,
}

impl GameResult {
    pub fn is_break(&self) -> bool {
        self.winner != self.server
    }
}

/// Play a service game to completion: first to four points, ahead by two.
pub fn play_game<R: Rng>(
    engine: &PointEngine,
    ctx: &MatchContext,
    server: Side,
    situation: &GameSituation,
    stats: &mut [FantasyStats; 2],
    rng: &mut R,
) -> GameResult {
    let mut server_points = 0u32;
    let mut returner_points = 0u32;
    let mut aces = 0;
    let mut double_faults = 0;

    let winner = loop {
        let pressure = pressure_situation(server_points, returner_points, server, situation);
        let outcome = engine.play_point(ctx, server, situation.current_set, pressure, rng);

        if outcome.ace {
            aces += 1;
            stats[server.index()].add_ace();
        }
        if outcome.double_fault {
            double_faults += 1;
            stats[server.index()].add_double_fault();
        }
        if outcome.server_won() {
            server_points += 1;
        } else {
            returner_points += 1;
        }

        if server_points >= 4 && server_points >= returner_points + 2 {
            break server;
        }
        if returner_points >= 4 && returner_points >= server_points + 2 {
            break server.other();
        }
    };

    stats[winner.index()].add_game_won();
    stats[winner.other().index()].add_game_lost();
    if winner != server {
        stats[winner.index()].add_break();
    }

    GameResult {
        server,
        winner,
        server_points,
        returner_points,
        points_played: server_points + returner_points,
        aces,
        double_faults,
    }
}
