use thiserror::Error;

/// Errors raised while loading player profiles or ELO tables.
///
/// The simulation itself never fails; these only surface at the data boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ELO table is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("Invalid {field} for {player}: {value}")]
    InvalidProfile {
        player: String,
        field: &'static str,
        value: f64,
    },
}

/// Errors raised while decoding or validating a simulation config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Blend weights for ELO gap >= {min_gap} do not sum to a positive value")]
    DegenerateWeights { min_gap: f64 },

    #[error("Invalid bounds for {name}: [{low}, {high}]")]
    InvalidBounds {
        name: &'static str,
        low: f64,
        high: f64,
    },

    #[error("Rally length distribution has no buckets with positive weight")]
    EmptyRallyDistribution,
}
