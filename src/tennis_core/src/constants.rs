/// League-average ELO rating (average rates are synthesized at this rating)
pub const AVG_ELO: f64 = 1500.0;

/// ELO distance from average that maps to a full unit of synthetic skill
pub const ELO_SKILL_SPAN: f64 = 500.0;

/// Synthetic skill factor is capped to this magnitude
pub const MAX_ELO_SKILL_FACTOR: f64 = 0.8;

/// League-average ace rate (% of service points)
pub const AVG_ACE_RATE: f64 = 6.0;

/// League-average double fault rate (% of service points)
pub const AVG_DOUBLE_FAULT_RATE: f64 = 4.0;

/// League-average first serve percentage
pub const AVG_FIRST_SERVE_PCT: f64 = 62.0;

/// League-average service points won (%)
pub const AVG_SERVICE_POINTS_WON: f64 = 62.0;

/// League-average return points won (%)
pub const AVG_RETURN_POINTS_WON: f64 = 38.0;

/// Share of a player's matches assumed on a surface with no recorded preference
pub const DEFAULT_SURFACE_SHARE: f64 = 0.33;

/// Surface weights by experience: (fewer than N surface matches, weight)
pub const SURFACE_WEIGHT_STEPS: [(u32, f64); 2] = [(5, 0.3), (10, 0.5)];

/// Surface weight once a player has enough matches on the surface
pub const EXPERIENCED_SURFACE_WEIGHT: f64 = 0.7;

/// Average minutes per game, used for match duration estimates
pub const MINUTES_PER_GAME: f64 = 8.5;

/// Percentiles reported for slate fantasy distributions
pub const SLATE_PERCENTILES: [usize; 9] = [1, 5, 10, 25, 50, 75, 90, 95, 99];

/// Weight applied to surface-specific data for a player with `surface_matches`
/// matches on that surface.
pub fn surface_weight(surface_matches: u32) -> f64 {
    for &(limit, weight) in SURFACE_WEIGHT_STEPS.iter() {
        if surface_matches < limit {
            return weight;
        }
    }
    EXPERIENCED_SURFACE_WEIGHT
}
