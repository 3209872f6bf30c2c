use serde::{Deserialize, Serialize};

use crate::profile::{CalibratedFactors, StatProfile};
use crate::surface::Surface;

/// One of the two players in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Player1 => 0,
            Side::Player2 => 1,
        }
    }
}

/// A player as resolved for one match: rates already locked in.
#[derive(Clone, Debug, PartialEq)]
pub struct Competitor {
    pub name: String,
    pub rates: StatProfile,
    pub elo: Option<f64>,
    pub factors: CalibratedFactors,
}

/// Everything the engines need for one match. Dropped when the match returns.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchContext {
    pub players: [Competitor; 2],
    pub surface: Surface,
    pub best_of_5: bool,
    pub use_variance: bool,
}

impl MatchContext {
    pub fn new(player1: Competitor, player2: Competitor, surface: Surface, best_of_5: bool) -> Self {
        MatchContext {
            players: [player1, player2],
            surface,
            best_of_5,
            use_variance: false,
        }
    }

    pub fn with_variance(mut self, use_variance: bool) -> Self {
        self.use_variance = use_variance;
        self
    }

    pub fn player(&self, side: Side) -> &Competitor {
        &self.players[side.index()]
    }

    pub fn sets_to_win(&self) -> u32 {
        if self.best_of_5 {
            3
        } else {
            2
        }
    }
}
