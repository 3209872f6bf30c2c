use serde::{Deserialize, Serialize};

/// Fantasy-relevant counts for one player in one match.
///
/// The engines write into this as the match is played; `finalize_match`
/// settles the match-level flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FantasyStats {
    pub match_won: bool,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub aces: u32,
    pub double_faults: u32,
    /// Return games won
    pub breaks: u32,
    /// Sets won with the opponent held to two games or fewer
    pub clean_sets: u32,
    pub straight_sets: bool,
    pub no_double_faults: bool,
}

impl FantasyStats {
    pub fn add_ace(&mut self) {
        self.aces += 1;
    }

    pub fn add_double_fault(&mut self) {
        self.double_faults += 1;
    }

    pub fn add_break(&mut self) {
        self.breaks += 1;
    }

    pub fn add_game_won(&mut self) {
        self.games_won += 1;
    }

    pub fn add_game_lost(&mut self) {
        self.games_lost += 1;
    }

    pub fn add_set_won(&mut self, opponent_games: u32) {
        self.sets_won += 1;
        if opponent_games <= 2 {
            self.clean_sets += 1;
        }
    }

    pub fn add_set_lost(&mut self) {
        self.sets_lost += 1;
    }

    pub fn finalize_match(&mut self, won: bool) {
        self.match_won = won;
        self.straight_sets = won && self.sets_lost == 0;
        self.no_double_faults = self.double_faults == 0;
    }
}

/// Points awarded per fantasy event for one match format.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoringTable {
    pub match_played: f64,
    pub match_won: f64,
    pub set_won: f64,
    pub set_lost: f64,
    pub game_won: f64,
    pub game_lost: f64,
    pub ace: f64,
    pub double_fault: f64,
    pub break_of_serve: f64,
    pub clean_set: f64,
    pub straight_sets: f64,
    pub no_double_faults: f64,
    pub ace_bonus: f64,
    pub ace_bonus_threshold: u32,
}

pub const BEST_OF_3_SCORING: ScoringTable = ScoringTable {
    match_played: 30.0,
    match_won: 6.0,
    set_won: 6.0,
    set_lost: -3.0,
    game_won: 2.5,
    game_lost: -2.0,
    ace: 0.4,
    double_fault: -1.0,
    break_of_serve: 0.75,
    clean_set: 4.0,
    straight_sets: 6.0,
    no_double_faults: 2.5,
    ace_bonus: 2.0,
    ace_bonus_threshold: 10,
};

pub const BEST_OF_5_SCORING: ScoringTable = ScoringTable {
    match_played: 30.0,
    match_won: 5.0,
    set_won: 5.0,
    set_lost: -2.5,
    game_won: 2.0,
    game_lost: -1.6,
    ace: 0.25,
    double_fault: -1.0,
    break_of_serve: 0.5,
    clean_set: 2.5,
    straight_sets: 5.0,
    no_double_faults: 5.0,
    ace_bonus: 2.0,
    ace_bonus_threshold: 15,
};

impl ScoringTable {
    pub fn for_format(best_of_5: bool) -> &'static ScoringTable {
        if best_of_5 {
            &BEST_OF_5_SCORING
        } else {
            &BEST_OF_3_SCORING
        }
    }

    pub fn score(&self, stats: &FantasyStats) -> f64 {
        let flag = |set: bool, points: f64| if set { points } else { 0.0 };

        self.match_played
            + flag(stats.match_won, self.match_won)
            + self.set_won * stats.sets_won as f64
            + self.set_lost * stats.sets_lost as f64
            + self.game_won * stats.games_won as f64
            + self.game_lost * stats.games_lost as f64
            + self.ace * stats.aces as f64
            + self.double_fault * stats.double_faults as f64
            + self.break_of_serve * stats.breaks as f64
            + self.clean_set * stats.clean_sets as f64
            + flag(stats.straight_sets, self.straight_sets)
            + flag(stats.no_double_faults, self.no_double_faults)
            + flag(stats.aces >= self.ace_bonus_threshold, self.ace_bonus)
    }
}

/// Fantasy points for a finalized stat line.
pub fn fantasy_points(stats: &FantasyStats, best_of_5: bool) -> f64 {
    ScoringTable::for_format(best_of_5).score(stats)
}
