use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::debug;

use crate::blend::ProbabilityBlender;
use crate::config::SimulationConfig;
use crate::context::{Competitor, MatchContext};
use crate::error::ConfigError;
use crate::match_sim::{MatchEngine, MatchResult};
use crate::point::PointEngine;
use crate::store::PlayerProfileStore;
use crate::surface::Surface;

/// Entry point for single-match simulation.
///
/// The store and config are shared read-only; each call owns its RNG.
#[derive(Clone, Debug)]
pub struct MatchSimulator {
    store: Arc<PlayerProfileStore>,
    config: Arc<SimulationConfig>,
    engine: MatchEngine,
}

impl MatchSimulator {
    pub fn new(store: Arc<PlayerProfileStore>, config: Arc<SimulationConfig>) -> Result<Self, ConfigError> {
        let engine = MatchEngine::new(PointEngine::new(&config)?);
        Ok(MatchSimulator { store, config, engine })
    }

    /// Simulator over `store` with the default config.
    pub fn with_store(store: Arc<PlayerProfileStore>) -> Result<Self, ConfigError> {
        MatchSimulator::new(store, Arc::new(SimulationConfig::default()))
    }

    /// Replace the probability blender, e.g. to inject a different weight policy.
    pub fn with_blender(mut self, blender: ProbabilityBlender) -> Self {
        let points = self.engine.point_engine().clone().with_blender(blender);
        self.engine = MatchEngine::new(points);
        self
    }

    pub fn store(&self) -> &PlayerProfileStore {
        &self.store
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Resolve both players and lock their match rates.
    pub fn prepare_context<R: Rng>(
        &self,
        player1: &str,
        player2: &str,
        surface: Surface,
        best_of_5: bool,
        use_variance: bool,
        rng: &mut R,
    ) -> MatchContext {
        self.prepare_context_with_variance(player1, player2, surface, best_of_5, use_variance, [None, None], rng)
    }

    /// Like `prepare_context`, with a per-player variance level override.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_context_with_variance<R: Rng>(
        &self,
        player1: &str,
        player2: &str,
        surface: Surface,
        best_of_5: bool,
        use_variance: bool,
        variance_levels: [Option<f64>; 2],
        rng: &mut R,
    ) -> MatchContext {
        let adjustment = self.engine.point_engine().adjustment();
        let mut resolve = |name: &str, level: Option<f64>| Competitor {
            name: name.to_string(),
            rates: adjustment.get_match_adjusted_probabilities(
                &self.store,
                name,
                surface,
                use_variance,
                level,
                None,
                rng,
            ),
            elo: self.store.get_player_elo(name, Some(surface)),
            factors: self.store.factors(name),
        };
        let first = resolve(player1, variance_levels[0]);
        let second = resolve(player2, variance_levels[1]);
        MatchContext::new(first, second, surface, best_of_5).with_variance(use_variance)
    }

    /// Simulate one match. The same seed always produces the same result.
    pub fn simulate_match(
        &self,
        player1: &str,
        player2: &str,
        surface: Surface,
        best_of_5: bool,
        use_variance: bool,
        seed: Option<u64>,
    ) -> MatchResult {
        let mut rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        self.simulate_match_with_rng(player1, player2, surface, best_of_5, use_variance, &mut rng)
    }

    pub fn simulate_match_with_rng<R: Rng>(
        &self,
        player1: &str,
        player2: &str,
        surface: Surface,
        best_of_5: bool,
        use_variance: bool,
        rng: &mut R,
    ) -> MatchResult {
        let ctx = self.prepare_context(player1, player2, surface, best_of_5, use_variance, rng);
        let result = self.engine.play(&ctx, rng);
        debug!(
            player1,
            player2,
            surface = %surface,
            score = %result.score_line(),
            points = result.total_points,
            "match simulated"
        );
        result
    }

    /// ELO-implied probability that `player1` beats `player2` on `surface`,
    /// or `None` when either rating is missing.
    pub fn elo_win_probability(&self, player1: &str, player2: &str, surface: Surface) -> Option<f64> {
        let elo1 = self.store.get_player_elo(player1, Some(surface))?;
        let elo2 = self.store.get_player_elo(player2, Some(surface))?;
        Some(self.engine.point_engine().blender().elo_win_probability(elo1, elo2))
    }
}
