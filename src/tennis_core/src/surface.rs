use serde::{Deserialize, Serialize};
use std::fmt;

/// Court surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Surface {
    #[default]
    Hard,
    Clay,
    Grass,
}

impl Surface {
    pub const ALL: [Surface; 3] = [Surface::Hard, Surface::Clay, Surface::Grass];

    /// Parse a surface name, falling back to `Hard` for anything unrecognised.
    pub fn parse(name: &str) -> Surface {
        match name.trim().to_ascii_lowercase().as_str() {
            "clay" | "c" => Surface::Clay,
            "grass" | "g" => Surface::Grass,
            _ => Surface::Hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Hard => "Hard",
            Surface::Clay => "Clay",
            Surface::Grass => "Grass",
        }
    }

    /// Match-level adjustment table for this surface.
    pub fn adjustment(&self) -> &'static SurfaceAdjustment {
        match self {
            Surface::Hard => &HARD_ADJUSTMENT,
            Surface::Clay => &CLAY_ADJUSTMENT,
            Surface::Grass => &GRASS_ADJUSTMENT,
        }
    }

    /// Surface-typical multipliers used when weighting a player's baseline stats.
    pub fn stat_multipliers(&self) -> &'static SurfaceStatMultipliers {
        match self {
            Surface::Hard => &HARD_STATS,
            Surface::Clay => &CLAY_STATS,
            Surface::Grass => &GRASS_STATS,
        }
    }
}

impl From<&str> for Surface {
    fn from(name: &str) -> Self {
        Surface::parse(name)
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match-level surface characteristics.
///
/// `variance_multiplier` is fractional: 0.30 means day-to-day swings of up to ±30%.
/// `rally_length_multiplier` stretches sampled rally lengths. The ace and fault
/// multipliers describe the surface relative to hard courts; per-player surface
/// effects on rates come from [`SurfaceStatMultipliers`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SurfaceAdjustment {
    pub ace_multiplier: f64,
    pub fault_multiplier: f64,
    pub rally_length_multiplier: f64,
    pub variance_multiplier: f64,
}

pub const HARD_ADJUSTMENT: SurfaceAdjustment = SurfaceAdjustment {
    ace_multiplier: 1.0,
    fault_multiplier: 1.0,
    rally_length_multiplier: 1.0,
    variance_multiplier: 0.35,
};

pub const CLAY_ADJUSTMENT: SurfaceAdjustment = SurfaceAdjustment {
    ace_multiplier: 0.7,
    fault_multiplier: 1.8,
    rally_length_multiplier: 1.2,
    variance_multiplier: 0.30,
};

pub const GRASS_ADJUSTMENT: SurfaceAdjustment = SurfaceAdjustment {
    ace_multiplier: 1.3,
    fault_multiplier: 3.2,
    rally_length_multiplier: 1.5,
    variance_multiplier: 0.25,
};

/// Multipliers applied to a player's all-surface rates to estimate surface-specific rates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SurfaceStatMultipliers {
    pub ace_rate: f64,
    pub double_fault_rate: f64,
    pub service_points_won: f64,
    pub return_points_won: f64,
}

pub const HARD_STATS: SurfaceStatMultipliers = SurfaceStatMultipliers {
    ace_rate: 1.0,
    double_fault_rate: 1.0,
    service_points_won: 1.0,
    return_points_won: 1.0,
};

pub const CLAY_STATS: SurfaceStatMultipliers = SurfaceStatMultipliers {
    ace_rate: 0.85,
    double_fault_rate: 1.1,
    service_points_won: 0.98,
    return_points_won: 1.02,
};

pub const GRASS_STATS: SurfaceStatMultipliers = SurfaceStatMultipliers {
    ace_rate: 1.15,
    double_fault_rate: 0.9,
    service_points_won: 1.05,
    return_points_won: 0.95,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_surfaces() {
        assert_eq!(Surface::parse("Clay"), Surface::Clay);
        assert_eq!(Surface::parse(" grass "), Surface::Grass);
        assert_eq!(Surface::parse("HARD"), Surface::Hard);
    }

    #[test]
    fn test_malformed_surface_falls_back_to_hard() {
        assert_eq!(Surface::parse("carpet"), Surface::Hard);
        assert_eq!(Surface::parse(""), Surface::Hard);
        assert_eq!(Surface::from("???").adjustment(), &HARD_ADJUSTMENT);
    }

    #[test]
    fn test_clay_slows_serve() {
        let clay = Surface::Clay.stat_multipliers();
        assert!(clay.ace_rate < 1.0);
        assert!(clay.double_fault_rate > 1.0);
        assert!(Surface::Clay.adjustment().rally_length_multiplier > 1.0);
    }
}
