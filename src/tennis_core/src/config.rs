//! Versioned simulation configuration.
//!
//! Every tunable constant of the simulation lives here. Calibration experiments
//! build a new config with the `with_*` methods instead of patching shared state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current configuration schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Closed interval used for clamping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub low: f64,
    pub high: f64,
}

impl Bound {
    pub const fn new(low: f64, high: f64) -> Self {
        Bound { low, high }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.low;
        }
        value.max(self.low).min(self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if !(self.low.is_finite() && self.high.is_finite()) || self.low > self.high {
            return Err(ConfigError::InvalidBounds {
                name,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Valid range for each adjusted rate (percent).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateBounds {
    pub ace_rate: Bound,
    pub double_fault_rate: Bound,
    pub first_serve_percentage: Bound,
    pub service_points_won: Bound,
    pub return_points_won: Bound,
}

impl Default for RateBounds {
    fn default() -> Self {
        RateBounds {
            ace_rate: Bound::new(0.5, 20.0),
            double_fault_rate: Bound::new(0.5, 12.0),
            first_serve_percentage: Bound::new(30.0, 90.0),
            service_points_won: Bound::new(30.0, 85.0),
            return_points_won: Bound::new(15.0, 70.0),
        }
    }
}

/// One row of the ELO-gap weight table. Applies to gaps `>= min_gap`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightTier {
    pub min_gap: f64,
    pub elo: f64,
    pub stats: f64,
    pub random: f64,
}

impl WeightTier {
    pub const fn new(min_gap: f64, elo: f64, stats: f64, random: f64) -> Self {
        WeightTier {
            min_gap,
            elo,
            stats,
            random,
        }
    }
}

/// Default ELO-gap tiers. Larger gaps lean on stats and randomness because ELO
/// alone over-amplifies dominance when applied point by point.
pub const DEFAULT_WEIGHT_TIERS: [WeightTier; 5] = [
    WeightTier::new(400.0, 0.20, 0.65, 0.15),
    WeightTier::new(300.0, 0.15, 0.50, 0.35),
    WeightTier::new(200.0, 0.35, 0.55, 0.10),
    WeightTier::new(100.0, 0.30, 0.60, 0.10),
    WeightTier::new(0.0, 0.35, 0.55, 0.10),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Logistic dampening constant; larger values flatten ELO edges
    pub elo_k: f64,
    /// Range the ELO-implied probability is clamped to
    pub elo_clamp: Bound,
    pub weight_tiers: Vec<WeightTier>,
}

impl Default for BlendConfig {
    fn default() -> Self {
        BlendConfig {
            elo_k: 1000.0,
            elo_clamp: Bound::new(0.20, 0.80),
            weight_tiers: DEFAULT_WEIGHT_TIERS.to_vec(),
        }
    }
}

/// Relative weight of each pressure situation when scaling the clutch factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureWeights {
    pub break_point: f64,
    pub game_point: f64,
    pub set_point: f64,
    pub match_point: f64,
    pub deuce: f64,
}

impl Default for PressureWeights {
    fn default() -> Self {
        PressureWeights {
            break_point: 1.0,
            game_point: 0.7,
            set_point: 1.2,
            match_point: 1.5,
            deuce: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    /// Widest day-to-day swing applied to ace and double fault rates
    pub rate_variance_cap: f64,
    /// Widest day-to-day swing applied to service and return rates
    pub skill_variance_cap: f64,
    pub bounds: RateBounds,
    pub pressure_weights: PressureWeights,
    pub clutch_bounds: Bound,
    /// Ace multiplier range under pressure: good clutch caps the boost, poor clutch floors the cut
    pub clutch_ace: Bound,
    /// Double fault multiplier range under pressure
    pub clutch_double_fault: Bound,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        AdjustmentConfig {
            rate_variance_cap: 0.12,
            skill_variance_cap: 0.10,
            bounds: RateBounds::default(),
            pressure_weights: PressureWeights::default(),
            clutch_bounds: Bound::new(0.7, 1.3),
            clutch_ace: Bound::new(0.8, 1.2),
            clutch_double_fault: Bound::new(0.8, 1.3),
        }
    }
}

/// Uniform range of rally lengths with a relative weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RallyBucket {
    pub min_shots: u32,
    pub max_shots: u32,
    pub weight: f64,
}

impl RallyBucket {
    pub const fn new(min_shots: u32, max_shots: u32, weight: f64) -> Self {
        RallyBucket {
            min_shots,
            max_shots,
            weight,
        }
    }
}

pub const DEFAULT_RALLY_BUCKETS: [RallyBucket; 5] = [
    RallyBucket::new(1, 3, 19.0),
    RallyBucket::new(4, 6, 7.0),
    RallyBucket::new(7, 9, 3.0),
    RallyBucket::new(10, 12, 3.0),
    RallyBucket::new(13, 25, 1.0),
];

/// Rally-length multipliers by playing style.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RallyStyleConfig {
    pub short_rally_max: u32,
    pub medium_rally_max: u32,
    pub quick_points_short: f64,
    pub grinder_short: f64,
    pub grinder_long: f64,
    pub balanced_long: f64,
    pub quick_points_long: f64,
}

impl Default for RallyStyleConfig {
    fn default() -> Self {
        RallyStyleConfig {
            short_rally_max: 3,
            medium_rally_max: 6,
            quick_points_short: 1.1,
            grinder_short: 0.95,
            grinder_long: 1.15,
            balanced_long: 1.05,
            quick_points_long: 0.85,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointConfig {
    pub first_serve_ace_multiplier: f64,
    pub second_serve_ace_multiplier: f64,
    /// Added to service points won on a first serve, capped at `first_serve_cap`
    pub first_serve_bonus: f64,
    pub first_serve_cap: f64,
    /// Subtracted from service points won on a second serve, floored at `second_serve_floor`
    pub second_serve_penalty: f64,
    pub second_serve_floor: f64,
    pub rally_buckets: Vec<RallyBucket>,
    pub rally_style: RallyStyleConfig,
}

impl Default for PointConfig {
    fn default() -> Self {
        PointConfig {
            first_serve_ace_multiplier: 1.3,
            second_serve_ace_multiplier: 0.4,
            first_serve_bonus: 14.0,
            first_serve_cap: 85.0,
            second_serve_penalty: 10.0,
            second_serve_floor: 35.0,
            rally_buckets: DEFAULT_RALLY_BUCKETS.to_vec(),
            rally_style: RallyStyleConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    /// Sets played fresh before fatigue starts
    pub fresh_sets: u32,
    pub decline_per_set: f64,
    pub bounds: Bound,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        FatigueConfig {
            fresh_sets: 2,
            decline_per_set: 0.05,
            bounds: Bound::new(0.8, 1.2),
        }
    }
}

/// Complete, versioned parameter set for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub version: u32,
    pub blend: BlendConfig,
    pub adjustment: AdjustmentConfig,
    pub point: PointConfig,
    pub fatigue: FatigueConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            version: CONFIG_VERSION,
            blend: BlendConfig::default(),
            adjustment: AdjustmentConfig::default(),
            point: PointConfig::default(),
            fatigue: FatigueConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Decode and validate a JSON config. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch {
                found: self.version,
                expected: CONFIG_VERSION,
            });
        }

        for tier in &self.blend.weight_tiers {
            let total = tier.elo + tier.stats + tier.random;
            let negative = tier.elo < 0.0 || tier.stats < 0.0 || tier.random < 0.0;
            if negative || !(total > 0.0) {
                return Err(ConfigError::DegenerateWeights {
                    min_gap: tier.min_gap,
                });
            }
        }

        self.blend.elo_clamp.validate("elo_clamp")?;
        let bounds = &self.adjustment.bounds;
        bounds.ace_rate.validate("ace_rate")?;
        bounds.double_fault_rate.validate("double_fault_rate")?;
        bounds.first_serve_percentage.validate("first_serve_percentage")?;
        bounds.service_points_won.validate("service_points_won")?;
        bounds.return_points_won.validate("return_points_won")?;
        self.adjustment.clutch_bounds.validate("clutch_bounds")?;
        self.adjustment.clutch_ace.validate("clutch_ace")?;
        self.adjustment.clutch_double_fault.validate("clutch_double_fault")?;
        self.fatigue.bounds.validate("fatigue")?;

        for bucket in &self.point.rally_buckets {
            if bucket.min_shots == 0 || bucket.min_shots > bucket.max_shots {
                return Err(ConfigError::InvalidBounds {
                    name: "rally_bucket",
                    low: bucket.min_shots as f64,
                    high: bucket.max_shots as f64,
                });
            }
        }
        if !self.point.rally_buckets.iter().any(|b| b.weight > 0.0) {
            return Err(ConfigError::EmptyRallyDistribution);
        }

        Ok(())
    }

    /// Copy of this config with a different ELO weight table.
    pub fn with_weight_tiers(&self, tiers: Vec<WeightTier>) -> Self {
        let mut config = self.clone();
        config.blend.weight_tiers = tiers;
        config
    }

    /// Copy of this config with a different ELO dampening constant.
    pub fn with_elo_k(&self, elo_k: f64) -> Self {
        let mut config = self.clone();
        config.blend.elo_k = elo_k;
        config
    }

    /// Copy of this config with different rate bounds.
    pub fn with_rate_bounds(&self, bounds: RateBounds) -> Self {
        let mut config = self.clone();
        config.adjustment.bounds = bounds;
        config
    }
}
