//! Match-level and point-level adjustments to a player's baseline rates.
//!
//! Day-to-day variance is sampled once when a match starts and then locked.
//! Clutch, rally and fatigue effects are applied per point on top of the
//! locked rates.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{AdjustmentConfig, FatigueConfig, PressureWeights, RallyStyleConfig, SimulationConfig};
use crate::profile::{CalibratedFactors, RallyType, StatProfile};
use crate::store::PlayerProfileStore;
use crate::surface::Surface;

/// High-leverage point categories. Ordered from most to least important.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressureSituation {
    MatchPoint,
    SetPoint,
    BreakPoint,
    GamePoint,
    Deuce,
}

impl PressureSituation {
    pub fn weight(self, weights: &PressureWeights) -> f64 {
        match self {
            PressureSituation::MatchPoint => weights.match_point,
            PressureSituation::SetPoint => weights.set_point,
            PressureSituation::BreakPoint => weights.break_point,
            PressureSituation::GamePoint => weights.game_point,
            PressureSituation::Deuce => weights.deuce,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AdjustmentLayer {
    config: AdjustmentConfig,
    rally_style: RallyStyleConfig,
    fatigue: FatigueConfig,
}

impl AdjustmentLayer {
    pub fn from_config(config: &SimulationConfig) -> Self {
        AdjustmentLayer {
            config: config.adjustment,
            rally_style: config.point.rally_style,
            fatigue: config.fatigue,
        }
    }

    pub fn config(&self) -> &AdjustmentConfig {
        &self.config
    }

    /// Rates for one player for one match, optionally tagged with a pressure situation.
    #[allow(clippy::too_many_arguments)]
    pub fn get_match_adjusted_probabilities<R: Rng>(
        &self,
        store: &PlayerProfileStore,
        name: &str,
        surface: Surface,
        use_variance: bool,
        variance_level: Option<f64>,
        pressure: Option<PressureSituation>,
        rng: &mut R,
    ) -> StatProfile {
        let baseline = store.get_player_stats(name, surface);
        let factors = store.factors(name);
        let locked = self.lock_match_rates(&baseline, &factors, surface, use_variance, variance_level, rng);
        match pressure {
            Some(situation) => self.apply_pressure(&locked, factors.clutch, situation),
            None => locked,
        }
    }

    /// Variance level for a player: explicit override, then personal, then surface default.
    pub fn variance_level(&self, factors: &CalibratedFactors, surface: Surface, level: Option<f64>) -> f64 {
        level
            .or(factors.variance)
            .unwrap_or(surface.adjustment().variance_multiplier)
    }

    /// Apply day-to-day variance to surface-weighted rates and clamp.
    pub fn lock_match_rates<R: Rng>(
        &self,
        baseline: &StatProfile,
        factors: &CalibratedFactors,
        surface: Surface,
        use_variance: bool,
        variance_level: Option<f64>,
        rng: &mut R,
    ) -> StatProfile {
        if !use_variance {
            return baseline.clamped(&self.config.bounds);
        }

        let level = self.variance_level(factors, surface, variance_level);
        let rate_band = band(level, self.config.rate_variance_cap);
        let skill_band = band(level, self.config.skill_variance_cap);
        let mut draw = |b: f64| rng.gen_range(1.0 - b..=1.0 + b);

        StatProfile {
            ace_rate: baseline.ace_rate * draw(rate_band),
            double_fault_rate: baseline.double_fault_rate * draw(rate_band),
            first_serve_percentage: baseline.first_serve_percentage,
            service_points_won: baseline.service_points_won * draw(skill_band),
            return_points_won: baseline.return_points_won * draw(skill_band),
        }
        .clamped(&self.config.bounds)
    }

    /// Clutch multiplier for a pressure situation, bounded.
    pub fn clutch_multiplier(&self, clutch: f64, situation: PressureSituation) -> f64 {
        let weight = situation.weight(&self.config.pressure_weights);
        self.config.clutch_bounds.clamp(1.0 + (clutch - 1.0) * weight)
    }

    /// Scale locked rates by the player's clutch factor for a pressure point.
    pub fn apply_pressure(&self, rates: &StatProfile, clutch: f64, situation: PressureSituation) -> StatProfile {
        let m = self.clutch_multiplier(clutch, situation);
        let (ace_mult, df_mult) = if m > 1.0 {
            (
                m.min(self.config.clutch_ace.high),
                (2.0 - m).max(self.config.clutch_double_fault.low),
            )
        } else if m < 1.0 {
            (
                m.max(self.config.clutch_ace.low),
                (2.0 - m).min(self.config.clutch_double_fault.high),
            )
        } else {
            (1.0, 1.0)
        };

        StatProfile {
            ace_rate: rates.ace_rate * ace_mult,
            double_fault_rate: rates.double_fault_rate * df_mult,
            first_serve_percentage: rates.first_serve_percentage,
            service_points_won: rates.service_points_won * m,
            return_points_won: rates.return_points_won * m,
        }
        .clamped(&self.config.bounds)
    }

    /// Strength multiplier for a rally of `rally_length` shots.
    pub fn rally_multiplier(&self, factors: &CalibratedFactors, rally_length: u32) -> f64 {
        let style = &self.rally_style;
        let effect = if rally_length <= style.short_rally_max {
            match factors.rally_type {
                RallyType::QuickPoints => style.quick_points_short,
                RallyType::Grinder => style.grinder_short,
                _ => 1.0,
            }
        } else if rally_length <= style.medium_rally_max {
            1.0
        } else {
            match factors.rally_type {
                RallyType::Grinder => style.grinder_long,
                RallyType::BalancedFighter => style.balanced_long,
                RallyType::QuickPoints => style.quick_points_long,
                RallyType::Consistent => 1.0,
            }
        };
        factors.rally_multiplier * effect
    }

    /// Strength multiplier for a player in set `current_set` (1-based).
    pub fn fatigue_multiplier(&self, factors: &CalibratedFactors, current_set: u32) -> f64 {
        if current_set <= self.fatigue.fresh_sets {
            return 1.0;
        }
        let tired_sets = (current_set - self.fatigue.fresh_sets) as f64;
        let decline = 1.0 - tired_sets * self.fatigue.decline_per_set * factors.fatigue_resistance;
        self.fatigue.bounds.clamp(decline * factors.momentum)
    }
}

fn band(level: f64, cap: f64) -> f64 {
    if level > 0.0 {
        level.min(cap)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PlayerProfile;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layer() -> AdjustmentLayer {
        AdjustmentLayer::from_config(&SimulationConfig::default())
    }

    fn clutch_factors(clutch: f64) -> CalibratedFactors {
        CalibratedFactors {
            clutch,
            ..CalibratedFactors::default()
        }
    }

    #[test]
    fn test_variance_off_is_deterministic() {
        let store = PlayerProfileStore::new();
        let layer = layer();
        let mut rng_a = ChaCha8Rng::seed_from_u64(1);
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);
        let a = layer.get_match_adjusted_probabilities(&store, "X", Surface::Clay, false, None, None, &mut rng_a);
        let b = layer.get_match_adjusted_probabilities(&store, "X", Surface::Clay, false, None, None, &mut rng_b);
        assert_eq!(a, b);
        assert_eq!(a, StatProfile::league_average());
    }

    #[test]
    fn test_variance_stays_in_band() {
        let layer = layer();
        let base = StatProfile::league_average();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let rates = layer.lock_match_rates(&base, &CalibratedFactors::default(), Surface::Hard, true, Some(0.5), &mut rng);
            assert!(rates.ace_rate >= 6.0 * 0.88 - 1e-9 && rates.ace_rate <= 6.0 * 1.12 + 1e-9);
            assert!(rates.service_points_won >= 62.0 * 0.9 - 1e-9);
            assert!(rates.service_points_won <= 62.0 * 1.1 + 1e-9);
            assert_eq!(rates.first_serve_percentage, 62.0);
        }
    }

    #[test]
    fn test_personal_variance_overrides_surface() {
        let layer = layer();
        let factors = CalibratedFactors {
            variance: Some(0.05),
            ..CalibratedFactors::default()
        };
        assert_eq!(layer.variance_level(&factors, Surface::Grass, None), 0.05);
        assert_eq!(layer.variance_level(&factors, Surface::Grass, Some(0.2)), 0.2);
        assert_eq!(layer.variance_level(&CalibratedFactors::default(), Surface::Grass, None), 0.25);
    }

    #[test]
    fn test_clutch_multiplier_weights() {
        let layer = layer();
        assert!((layer.clutch_multiplier(1.2, PressureSituation::BreakPoint) - 1.2).abs() < 1e-12);
        assert!((layer.clutch_multiplier(1.2, PressureSituation::Deuce) - 1.1).abs() < 1e-12);
        assert_eq!(layer.clutch_multiplier(1.4, PressureSituation::MatchPoint), 1.3);
        assert_eq!(layer.clutch_multiplier(0.5, PressureSituation::SetPoint), 0.7);
        assert_eq!(layer.clutch_multiplier(1.0, PressureSituation::MatchPoint), 1.0);
    }

    #[test]
    fn test_good_clutch_boosts_serve() {
        let layer = layer();
        let base = StatProfile::league_average();
        let pressured = layer.apply_pressure(&base, 1.3, PressureSituation::BreakPoint);
        assert!(pressured.service_points_won > base.service_points_won);
        assert!(pressured.ace_rate <= base.ace_rate * 1.2 + 1e-9);
        assert!(pressured.double_fault_rate < base.double_fault_rate);
    }

    #[test]
    fn test_poor_clutch_hurts_serve() {
        let layer = layer();
        let base = StatProfile::league_average();
        let pressured = layer.apply_pressure(&base, 0.6, PressureSituation::MatchPoint);
        assert!(pressured.service_points_won < base.service_points_won);
        assert!((pressured.ace_rate - base.ace_rate * 0.8).abs() < 1e-9);
        assert!((pressured.double_fault_rate - base.double_fault_rate * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_uses_store_factors() {
        let profile = PlayerProfile::new("Ice", StatProfile::league_average()).with_factors(clutch_factors(1.25));
        let store = PlayerProfileStore::new().with_profile(profile);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let rates = layer().get_match_adjusted_probabilities(
            &store,
            "Ice",
            Surface::Hard,
            false,
            None,
            Some(PressureSituation::BreakPoint),
            &mut rng,
        );
        assert!(rates.service_points_won > 62.0);
    }

    #[test]
    fn test_rally_multiplier_by_style() {
        let layer = layer();
        let mut factors = CalibratedFactors {
            rally_type: RallyType::Grinder,
            ..CalibratedFactors::default()
        };
        assert_eq!(layer.rally_multiplier(&factors, 2), 0.95);
        assert_eq!(layer.rally_multiplier(&factors, 5), 1.0);
        assert_eq!(layer.rally_multiplier(&factors, 12), 1.15);

        factors.rally_type = RallyType::QuickPoints;
        factors.rally_multiplier = 2.0;
        assert!((layer.rally_multiplier(&factors, 1) - 2.2).abs() < 1e-12);
        assert!((layer.rally_multiplier(&factors, 9) - 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_fatigue_multiplier() {
        let layer = layer();
        let factors = CalibratedFactors::default();
        assert_eq!(layer.fatigue_multiplier(&factors, 1), 1.0);
        assert_eq!(layer.fatigue_multiplier(&factors, 2), 1.0);
        assert!((layer.fatigue_multiplier(&factors, 3) - 0.95).abs() < 1e-12);
        assert!((layer.fatigue_multiplier(&factors, 5) - 0.85).abs() < 1e-12);

        let fragile = CalibratedFactors {
            fatigue_resistance: 3.0,
            ..CalibratedFactors::default()
        };
        assert_eq!(layer.fatigue_multiplier(&fragile, 5), 0.8);
    }

    proptest! {
        #[test]
        fn prop_adjusted_rates_stay_in_bounds(
            ace in 0.0f64..40.0,
            df in 0.0f64..30.0,
            serve in 0.0f64..100.0,
            ret in 0.0f64..100.0,
            clutch in 0.0f64..3.0,
            level in 0.0f64..1.0,
            seed in any::<u64>(),
        ) {
            let layer = layer();
            let bounds = layer.config().bounds;
            let base = StatProfile {
                ace_rate: ace,
                double_fault_rate: df,
                first_serve_percentage: 62.0,
                service_points_won: serve,
                return_points_won: ret,
            };
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let locked = layer.lock_match_rates(&base, &clutch_factors(clutch), Surface::Grass, true, Some(level), &mut rng);
            let adjusted = layer.apply_pressure(&locked, clutch, PressureSituation::MatchPoint);
            for rates in [locked, adjusted] {
                prop_assert!(bounds.ace_rate.contains(rates.ace_rate));
                prop_assert!(bounds.double_fault_rate.contains(rates.double_fault_rate));
                prop_assert!(bounds.first_serve_percentage.contains(rates.first_serve_percentage));
                prop_assert!(bounds.service_points_won.contains(rates.service_points_won));
                prop_assert!(bounds.return_points_won.contains(rates.return_points_won));
            }
        }
    }
}
