use std::fmt;
use std::sync::Arc;

use crate::config::{BlendConfig, Bound, WeightTier};

/// Normalized weights of the three blend components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendWeights {
    pub elo: f64,
    pub stats: f64,
    pub random: f64,
}

impl BlendWeights {
    /// Scale the components so they sum to 1. Degenerate input falls back to stats only.
    pub fn normalized(elo: f64, stats: f64, random: f64) -> Self {
        let (elo, stats, random) = (elo.max(0.0), stats.max(0.0), random.max(0.0));
        let total = elo + stats + random;
        if !(total > 0.0) || !total.is_finite() {
            return BlendWeights::stats_only();
        }
        BlendWeights {
            elo: elo / total,
            stats: stats / total,
            random: random / total,
        }
    }

    pub fn stats_only() -> Self {
        BlendWeights {
            elo: 0.0,
            stats: 1.0,
            random: 0.0,
        }
    }
}

/// Chooses blend weights from the absolute ELO gap between two players.
pub trait WeightPolicy: Send + Sync + fmt::Debug {
    fn weights(&self, elo_gap: f64) -> BlendWeights;
}

/// Weight table keyed by minimum ELO gap; the first tier the gap reaches wins.
#[derive(Clone, Debug)]
pub struct TieredWeights {
    tiers: Vec<WeightTier>,
}

impl TieredWeights {
    pub fn new(tiers: &[WeightTier]) -> Self {
        let mut tiers = tiers.to_vec();
        tiers.sort_by(|a, b| b.min_gap.total_cmp(&a.min_gap));
        TieredWeights { tiers }
    }
}

impl WeightPolicy for TieredWeights {
    fn weights(&self, elo_gap: f64) -> BlendWeights {
        let gap = elo_gap.abs();
        self.tiers
            .iter()
            .find(|tier| gap >= tier.min_gap)
            .map(|tier| BlendWeights::normalized(tier.elo, tier.stats, tier.random))
            .unwrap_or_else(BlendWeights::stats_only)
    }
}

/// Same weights regardless of the gap.
#[derive(Clone, Copy, Debug)]
pub struct FixedWeights(pub BlendWeights);

impl WeightPolicy for FixedWeights {
    fn weights(&self, _elo_gap: f64) -> BlendWeights {
        self.0
    }
}

/// Combines stats-implied, ELO-implied and neutral probabilities into the
/// probability that the server wins a point.
#[derive(Clone, Debug)]
pub struct ProbabilityBlender {
    elo_k: f64,
    elo_clamp: Bound,
    policy: Arc<dyn WeightPolicy>,
}

impl Default for ProbabilityBlender {
    fn default() -> Self {
        ProbabilityBlender::from_config(&BlendConfig::default())
    }
}

impl ProbabilityBlender {
    pub fn from_config(config: &BlendConfig) -> Self {
        ProbabilityBlender {
            elo_k: config.elo_k,
            elo_clamp: config.elo_clamp,
            policy: Arc::new(TieredWeights::new(&config.weight_tiers)),
        }
    }

    /// Replace the weight policy, keeping the ELO curve.
    pub fn with_policy(mut self, policy: Arc<dyn WeightPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Dampened logistic ELO expectation, clamped to the configured range.
    pub fn elo_win_probability(&self, elo_a: f64, elo_b: f64) -> f64 {
        let raw = 1.0 / (1.0 + 10f64.powf((elo_b - elo_a) / self.elo_k));
        self.elo_clamp.clamp(raw)
    }

    pub fn stats_probability(server_strength: f64, returner_strength: f64) -> f64 {
        let total = server_strength + returner_strength;
        if !(total > 0.0) {
            return 0.5;
        }
        server_strength / total
    }

    pub fn weights(&self, elo_gap: f64) -> BlendWeights {
        self.policy.weights(elo_gap)
    }

    /// Probability that the server wins the point.
    ///
    /// Falls back to the stats ratio when either ELO rating is missing.
    pub fn blend(
        &self,
        server_strength: f64,
        returner_strength: f64,
        elo_server: Option<f64>,
        elo_returner: Option<f64>,
    ) -> f64 {
        let stats_prob = Self::stats_probability(server_strength, returner_strength);
        let (Some(elo_server), Some(elo_returner)) = (elo_server, elo_returner) else {
            return stats_prob;
        };

        let elo_prob = self.elo_win_probability(elo_server, elo_returner);
        let w = self.policy.weights(elo_server - elo_returner);
        (w.elo * elo_prob + w.stats * stats_prob + w.random * 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stats_probability() {
        assert_eq!(ProbabilityBlender::stats_probability(60.0, 40.0), 0.6);
        assert_eq!(ProbabilityBlender::stats_probability(0.0, 0.0), 0.5);
    }

    #[test]
    fn test_elo_probability_is_clamped() {
        let blender = ProbabilityBlender::default();
        assert_eq!(blender.elo_win_probability(1500.0, 1500.0), 0.5);
        assert_eq!(blender.elo_win_probability(3000.0, 1000.0), 0.8);
        assert_eq!(blender.elo_win_probability(1000.0, 3000.0), 0.2);
    }

    #[test]
    fn test_missing_elo_uses_stats_only() {
        let blender = ProbabilityBlender::default();
        assert_eq!(blender.blend(65.0, 35.0, Some(2000.0), None), 0.65);
        assert_eq!(blender.blend(65.0, 35.0, None, None), 0.65);
    }

    #[test]
    fn test_tiers_select_by_gap() {
        let blender = ProbabilityBlender::default();
        let wide = blender.weights(450.0);
        assert!((wide.stats - 0.65).abs() < 1e-12);
        let mid = blender.weights(-320.0);
        assert!((mid.random - 0.35).abs() < 1e-12);
        let close = blender.weights(50.0);
        assert!((close.elo - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_weights_are_normalized() {
        let w = BlendWeights::normalized(2.0, 1.0, 1.0);
        assert_eq!(w, BlendWeights { elo: 0.5, stats: 0.25, random: 0.25 });
        assert_eq!(BlendWeights::normalized(0.0, 0.0, 0.0), BlendWeights::stats_only());
    }

    #[test]
    fn test_injected_policy() {
        let policy = FixedWeights(BlendWeights::normalized(0.0, 0.0, 1.0));
        let blender = ProbabilityBlender::default().with_policy(Arc::new(policy));
        assert_eq!(blender.blend(90.0, 10.0, Some(2500.0), Some(1200.0)), 0.5);
    }

    #[test]
    fn test_empty_tier_table_uses_stats() {
        let config = BlendConfig {
            weight_tiers: vec![],
            ..BlendConfig::default()
        };
        let blender = ProbabilityBlender::from_config(&config);
        assert_eq!(blender.blend(70.0, 30.0, Some(2000.0), Some(1500.0)), 0.7);
    }

    proptest! {
        #[test]
        fn prop_elo_symmetry(a in 800.0f64..2600.0, b in 800.0f64..2600.0) {
            let blender = ProbabilityBlender::default();
            let sum = blender.elo_win_probability(a, b) + blender.elo_win_probability(b, a);
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_blend_symmetry(
            s in 1.0f64..100.0,
            r in 1.0f64..100.0,
            a in 800.0f64..2600.0,
            b in 800.0f64..2600.0,
        ) {
            let blender = ProbabilityBlender::default();
            let p = blender.blend(s, r, Some(a), Some(b));
            let q = blender.blend(r, s, Some(b), Some(a));
            prop_assert!((0.0..=1.0).contains(&p));
            prop_assert!((p + q - 1.0).abs() < 1e-9);
        }
    }
}
