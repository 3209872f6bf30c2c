use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::adjustment::{AdjustmentLayer, PressureSituation};
use crate::blend::ProbabilityBlender;
use crate::config::{PointConfig, RallyBucket, SimulationConfig};
use crate::context::{MatchContext, Side};
use crate::error::ConfigError;
use crate::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServeType {
    First,
    Second,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointWinner {
    Server,
    Returner,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointOutcome {
    pub winner: PointWinner,
    pub ace: bool,
    pub double_fault: bool,
    pub serve: ServeType,
    /// Estimated shots in the rally
    pub rally_length: u32,
    pub pressure: Option<PressureSituation>,
}

impl PointOutcome {
    pub fn server_won(&self) -> bool {
        self.winner == PointWinner::Server
    }
}

/// Where the current game sits within the set and match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameSituation {
    /// 1-based set number
    pub current_set: u32,
    /// Side that wins the set by winning this game
    pub set_point_for: Option<Side>,
    /// Per side, whether winning the current set wins the match
    pub set_decides_match: [bool; 2],
}

impl GameSituation {
    pub fn first_set() -> Self {
        GameSituation {
            current_set: 1,
            set_point_for: None,
            set_decides_match: [false, false],
        }
    }

    fn closing_tag(&self, side: Side) -> PressureSituation {
        if self.set_decides_match[side.index()] {
            PressureSituation::MatchPoint
        } else {
            PressureSituation::SetPoint
        }
    }
}

/// Pressure tag for the next point of a regular game, from the score before the point.
pub fn pressure_situation(
    server_points: u32,
    returner_points: u32,
    server: Side,
    situation: &GameSituation,
) -> Option<PressureSituation> {
    let one_from_game = |own: u32, opp: u32| own >= 3 && own > opp;

    if let Some(side) = situation.set_point_for {
        let (own, opp) = if side == server {
            (server_points, returner_points)
        } else {
            (returner_points, server_points)
        };
        if one_from_game(own, opp) {
            return Some(situation.closing_tag(side));
        }
    }

    if one_from_game(returner_points, server_points) {
        Some(PressureSituation::BreakPoint)
    } else if one_from_game(server_points, returner_points) {
        Some(PressureSituation::GamePoint)
    } else if server_points >= 3 && returner_points >= 3 {
        Some(PressureSituation::Deuce)
    } else {
        None
    }
}

/// Pressure tag for the next tiebreak point. Only set and match points are tagged.
pub fn tiebreak_pressure(points: [u32; 2], situation: &GameSituation) -> Option<PressureSituation> {
    [Side::Player1, Side::Player2].into_iter().find_map(|side| {
        let own = points[side.index()];
        let opp = points[side.other().index()];
        (own >= 6 && own > opp).then(|| situation.closing_tag(side))
    })
}

/// Plays single points: serve, fault, ace, rally, then a blended draw.
#[derive(Clone, Debug)]
pub struct PointEngine {
    config: PointConfig,
    adjustment: AdjustmentLayer,
    blender: ProbabilityBlender,
    rally_buckets: Vec<RallyBucket>,
    rally_index: WeightedIndex<f64>,
}

impl PointEngine {
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rally_buckets = config.point.rally_buckets.clone();
        let rally_index = WeightedIndex::new(rally_buckets.iter().map(|b| b.weight))
            .map_err(|_| ConfigError::EmptyRallyDistribution)?;
        Ok(PointEngine {
            config: config.point.clone(),
            adjustment: AdjustmentLayer::from_config(config),
            blender: ProbabilityBlender::from_config(&config.blend),
            rally_buckets,
            rally_index,
        })
    }

    pub fn with_blender(mut self, blender: ProbabilityBlender) -> Self {
        self.blender = blender;
        self
    }

    pub fn blender(&self) -> &ProbabilityBlender {
        &self.blender
    }

    pub fn adjustment(&self) -> &AdjustmentLayer {
        &self.adjustment
    }

    /// Draw a rally length in shots, stretched by the surface.
    pub fn sample_rally_length<R: Rng>(&self, surface: Surface, rng: &mut R) -> u32 {
        let bucket = &self.rally_buckets[self.rally_index.sample(rng)];
        let shots = rng.gen_range(bucket.min_shots..=bucket.max_shots);
        let stretched = (shots as f64 * surface.adjustment().rally_length_multiplier).round();
        (stretched as u32).max(1)
    }

    /// Play one point with `server` serving in set `current_set`.
    pub fn play_point<R: Rng>(
        &self,
        ctx: &MatchContext,
        server: Side,
        current_set: u32,
        pressure: Option<PressureSituation>,
        rng: &mut R,
    ) -> PointOutcome {
        let srv = ctx.player(server);
        let ret = ctx.player(server.other());
        let (srv_rates, ret_rates) = match pressure {
            Some(situation) => (
                self.adjustment.apply_pressure(&srv.rates, srv.factors.clutch, situation),
                self.adjustment.apply_pressure(&ret.rates, ret.factors.clutch, situation),
            ),
            None => (srv.rates, ret.rates),
        };

        let serve = if rng.gen::<f64>() * 100.0 < srv_rates.first_serve_percentage {
            ServeType::First
        } else {
            ServeType::Second
        };
        let mut outcome = PointOutcome {
            winner: PointWinner::Server,
            ace: false,
            double_fault: false,
            serve,
            rally_length: 1,
            pressure,
        };

        if serve == ServeType::Second && rng.gen::<f64>() * 100.0 < srv_rates.double_fault_rate {
            outcome.winner = PointWinner::Returner;
            outcome.double_fault = true;
            return outcome;
        }

        let ace_multiplier = match serve {
            ServeType::First => self.config.first_serve_ace_multiplier,
            ServeType::Second => self.config.second_serve_ace_multiplier,
        };
        if rng.gen::<f64>() * 100.0 < srv_rates.ace_rate * ace_multiplier {
            outcome.ace = true;
            return outcome;
        }

        let mut server_strength = match serve {
            ServeType::First => (srv_rates.service_points_won + self.config.first_serve_bonus)
                .min(self.config.first_serve_cap),
            ServeType::Second => (srv_rates.service_points_won - self.config.second_serve_penalty)
                .max(self.config.second_serve_floor),
        };
        let mut returner_strength = ret_rates.return_points_won;

        let rally_length = self.sample_rally_length(ctx.surface, rng);
        outcome.rally_length = rally_length;
        server_strength *= self.adjustment.rally_multiplier(&srv.factors, rally_length)
            * self.adjustment.fatigue_multiplier(&srv.factors, current_set);
        returner_strength *= self.adjustment.rally_multiplier(&ret.factors, rally_length)
            * self.adjustment.fatigue_multiplier(&ret.factors, current_set);

        let p = self.blender.blend(server_strength, returner_strength, srv.elo, ret.elo);
        if rng.gen::<f64>() >= p {
            outcome.winner = PointWinner::Returner;
        }
        outcome
    }
}
