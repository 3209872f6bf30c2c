//! Tennis Core - point-by-point tennis match simulation with fantasy scoring.
//!
//! Matches are played point by point from player profiles and ELO ratings,
//! with surface, variance, clutch, rally and fatigue adjustments, and scored
//! for fantasy contests. Python bindings are available behind the `python`
//! feature.

pub mod adjustment;
pub mod blend;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod fantasy;
pub mod game;
pub mod match_sim;
pub mod point;
pub mod profile;
pub mod set;
pub mod simulator;
pub mod slate;
pub mod store;
pub mod surface;
pub mod tiebreak;

#[cfg(feature = "python")]
mod python;

pub use adjustment::{AdjustmentLayer, PressureSituation};
pub use blend::{BlendWeights, FixedWeights, ProbabilityBlender, TieredWeights, WeightPolicy};
pub use config::{SimulationConfig, CONFIG_VERSION};
pub use context::{Competitor, MatchContext, Side};
pub use error::{ConfigError, StoreError};
pub use fantasy::{fantasy_points, FantasyStats, ScoringTable};
pub use game::{play_game, GameResult};
pub use match_sim::{MatchEngine, MatchResult};
pub use point::{PointEngine, PointOutcome, ServeType};
pub use profile::{CalibratedFactors, Gender, PlayerProfile, RallyType, StatProfile};
pub use set::{play_set, SetResult};
pub use simulator::MatchSimulator;
pub use slate::{Matchup, MatchupSummary, PlayerDistribution, SlateReport, SlateSimulator};
pub use store::PlayerProfileStore;
pub use surface::Surface;
pub use tiebreak::{play_tiebreak, TiebreakResult};
