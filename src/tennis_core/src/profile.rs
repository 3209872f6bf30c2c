use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::RateBounds;
use crate::constants::{
    AVG_ACE_RATE, AVG_DOUBLE_FAULT_RATE, AVG_ELO, AVG_FIRST_SERVE_PCT, AVG_RETURN_POINTS_WON,
    AVG_SERVICE_POINTS_WON, DEFAULT_SURFACE_SHARE, ELO_SKILL_SPAN, MAX_ELO_SKILL_FACTOR,
};
use crate::surface::{Surface, SurfaceStatMultipliers};

/// Point-level rates for one player, all expressed in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatProfile {
    /// Aces per service point
    pub ace_rate: f64,
    /// Double faults per service point
    pub double_fault_rate: f64,
    /// First serves landed in
    pub first_serve_percentage: f64,
    /// Service points won
    pub service_points_won: f64,
    /// Return points won (measured independently of service points won)
    pub return_points_won: f64,
}

impl Default for StatProfile {
    fn default() -> Self {
        StatProfile::league_average()
    }
}

impl StatProfile {
    pub fn league_average() -> Self {
        StatProfile {
            ace_rate: AVG_ACE_RATE,
            double_fault_rate: AVG_DOUBLE_FAULT_RATE,
            first_serve_percentage: AVG_FIRST_SERVE_PCT,
            service_points_won: AVG_SERVICE_POINTS_WON,
            return_points_won: AVG_RETURN_POINTS_WON,
        }
    }

    /// Synthesize rates from an ELO rating by scaling linearly around the league average.
    ///
    /// An ELO of 1500 yields average rates. Missing ELO yields average rates too.
    pub fn from_elo(elo: Option<f64>) -> Self {
        let Some(elo) = elo else {
            return StatProfile::league_average();
        };

        let factor = ((elo - AVG_ELO) / ELO_SKILL_SPAN).clamp(-MAX_ELO_SKILL_FACTOR, MAX_ELO_SKILL_FACTOR);

        StatProfile {
            ace_rate: (AVG_ACE_RATE + factor * 2.0).clamp(1.0, 20.0),
            double_fault_rate: (AVG_DOUBLE_FAULT_RATE - factor).clamp(1.0, 12.0),
            first_serve_percentage: (AVG_FIRST_SERVE_PCT + factor * 4.0).clamp(40.0, 80.0),
            service_points_won: (AVG_SERVICE_POINTS_WON + factor * 8.0).clamp(40.0, 85.0),
            return_points_won: (AVG_RETURN_POINTS_WON + factor * 6.0).clamp(15.0, 60.0),
        }
    }

    /// Blend these rates with their surface-adjusted counterparts.
    ///
    /// `weight` is the share given to the surface-adjusted value.
    pub fn surface_weighted(&self, multipliers: &SurfaceStatMultipliers, weight: f64) -> Self {
        let blend = |base: f64, mult: f64| weight * base * mult + (1.0 - weight) * base;
        StatProfile {
            ace_rate: blend(self.ace_rate, multipliers.ace_rate),
            double_fault_rate: blend(self.double_fault_rate, multipliers.double_fault_rate),
            first_serve_percentage: self.first_serve_percentage,
            service_points_won: blend(self.service_points_won, multipliers.service_points_won),
            return_points_won: blend(self.return_points_won, multipliers.return_points_won),
        }
    }

    /// Clamp every rate into `bounds`.
    pub fn clamped(&self, bounds: &RateBounds) -> Self {
        StatProfile {
            ace_rate: bounds.ace_rate.clamp(self.ace_rate),
            double_fault_rate: bounds.double_fault_rate.clamp(self.double_fault_rate),
            first_serve_percentage: bounds.first_serve_percentage.clamp(self.first_serve_percentage),
            service_points_won: bounds.service_points_won.clamp(self.service_points_won),
            return_points_won: bounds.return_points_won.clamp(self.return_points_won),
        }
    }

    /// Named rates, for validation and reporting.
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("ace_rate", self.ace_rate),
            ("double_fault_rate", self.double_fault_rate),
            ("first_serve_percentage", self.first_serve_percentage),
            ("service_points_won", self.service_points_won),
            ("return_points_won", self.return_points_won),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    Men,
    Women,
}

impl Gender {
    pub fn parse(code: &str) -> Gender {
        match code.trim().to_ascii_uppercase().as_str() {
            "W" | "F" | "WTA" | "WOMEN" => Gender::Women,
            _ => Gender::Men,
        }
    }
}

/// Playing style with respect to rally length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RallyType {
    /// Wins short points, fades in long exchanges
    QuickPoints,
    /// Thrives in long rallies
    Grinder,
    BalancedFighter,
    #[default]
    Consistent,
}

impl RallyType {
    pub fn parse(label: &str) -> RallyType {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "quickpoints" => RallyType::QuickPoints,
            "grinder" => RallyType::Grinder,
            "balancedfighter" => RallyType::BalancedFighter,
            _ => RallyType::Consistent,
        }
    }
}

/// Per-player factors calibrated from historical pressure, rally and endurance data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratedFactors {
    /// > 1.0 over-performs on pressure points, < 1.0 under-performs
    pub clutch: f64,
    /// Personal day-to-day variance; overrides the surface default when set
    pub variance: Option<f64>,
    pub rally_type: RallyType,
    pub rally_multiplier: f64,
    /// Scales how quickly the player tires after the second set
    pub fatigue_resistance: f64,
    pub momentum: f64,
}

impl Default for CalibratedFactors {
    fn default() -> Self {
        CalibratedFactors {
            clutch: 1.0,
            variance: None,
            rally_type: RallyType::Consistent,
            rally_multiplier: 1.0,
            fatigue_resistance: 1.0,
            momentum: 1.0,
        }
    }
}

/// Everything known about one player.
///
/// Profiles are immutable during simulation; calibration builds new ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub gender: Gender,
    /// Matches behind the measured rates
    pub matches: u32,
    /// All-surface baseline rates
    pub stats: StatProfile,
    /// Fraction of matches played on each surface
    pub surface_preferences: HashMap<Surface, f64>,
    pub factors: CalibratedFactors,
    pub elo_overall: Option<f64>,
    pub elo_by_surface: HashMap<Surface, f64>,
}

impl PlayerProfile {
    pub fn new(name: impl Into<String>, stats: StatProfile) -> Self {
        PlayerProfile {
            name: name.into(),
            gender: Gender::Men,
            matches: 0,
            stats,
            surface_preferences: HashMap::new(),
            factors: CalibratedFactors::default(),
            elo_overall: None,
            elo_by_surface: HashMap::new(),
        }
    }

    pub fn with_matches(mut self, matches: u32) -> Self {
        self.matches = matches;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_factors(mut self, factors: CalibratedFactors) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_elo(mut self, elo: f64) -> Self {
        self.elo_overall = Some(elo);
        self
    }

    pub fn with_surface_elo(mut self, surface: Surface, elo: f64) -> Self {
        self.elo_by_surface.insert(surface, elo);
        self
    }

    pub fn with_surface_preference(mut self, surface: Surface, share: f64) -> Self {
        self.surface_preferences.insert(surface, share);
        self
    }

    /// Estimated number of matches played on `surface`.
    pub fn surface_matches(&self, surface: Surface) -> u32 {
        let share = self
            .surface_preferences
            .get(&surface)
            .copied()
            .unwrap_or(DEFAULT_SURFACE_SHARE);
        (self.matches as f64 * share.max(0.0)).floor() as u32
    }
}
