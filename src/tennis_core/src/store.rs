use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::{
    surface_weight, AVG_ACE_RATE, AVG_DOUBLE_FAULT_RATE, AVG_FIRST_SERVE_PCT, AVG_RETURN_POINTS_WON,
    AVG_SERVICE_POINTS_WON,
};
use crate::error::StoreError;
use crate::profile::{CalibratedFactors, Gender, PlayerProfile, RallyType, StatProfile};
use crate::surface::Surface;

/// Read-only lookup of player profiles and ELO ratings.
///
/// Lookups never fail: unknown players get synthetic rates derived from
/// their ELO rating, or league-average rates when no rating exists either.
#[derive(Clone, Debug, Default)]
pub struct PlayerProfileStore {
    profiles: HashMap<String, PlayerProfile>,
    /// Ratings for players without a statistical profile
    elo_only: HashMap<String, EloRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct EloRecord {
    overall: f64,
    by_surface: HashMap<Surface, f64>,
}

/// One player in a calculated-stats JSON snapshot.
#[derive(Deserialize)]
struct ProfileRecord {
    ace_rate: Option<f64>,
    double_fault_rate: Option<f64>,
    first_serve_percentage: Option<f64>,
    service_points_won: Option<f64>,
    return_points_won: Option<f64>,
    #[serde(default)]
    matches: u32,
    gender: Option<String>,
    #[serde(default)]
    surface_preferences: HashMap<String, f64>,
    clutch_factor: Option<f64>,
    variance_multiplier: Option<f64>,
    rally_type: Option<String>,
    rally_multiplier: Option<f64>,
    endurance_factor: Option<f64>,
    momentum_factor: Option<f64>,
    elo_rating: Option<f64>,
}

impl ProfileRecord {
    fn into_profile(self, name: String) -> Result<PlayerProfile, StoreError> {
        let stats = StatProfile {
            ace_rate: self.ace_rate.unwrap_or(AVG_ACE_RATE),
            double_fault_rate: self.double_fault_rate.unwrap_or(AVG_DOUBLE_FAULT_RATE),
            first_serve_percentage: self.first_serve_percentage.unwrap_or(AVG_FIRST_SERVE_PCT),
            service_points_won: self.service_points_won.unwrap_or(AVG_SERVICE_POINTS_WON),
            return_points_won: self.return_points_won.unwrap_or(AVG_RETURN_POINTS_WON),
        };
        for (field, value) in stats.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(StoreError::InvalidProfile {
                    player: name,
                    field,
                    value,
                });
            }
        }

        let defaults = CalibratedFactors::default();
        let factors = CalibratedFactors {
            clutch: self.clutch_factor.unwrap_or(defaults.clutch),
            variance: self.variance_multiplier,
            rally_type: self
                .rally_type
                .as_deref()
                .map(RallyType::parse)
                .unwrap_or_default(),
            rally_multiplier: self.rally_multiplier.unwrap_or(defaults.rally_multiplier),
            fatigue_resistance: self.endurance_factor.unwrap_or(defaults.fatigue_resistance),
            momentum: self.momentum_factor.unwrap_or(defaults.momentum),
        };

        let mut profile = PlayerProfile::new(name, stats)
            .with_matches(self.matches)
            .with_gender(self.gender.as_deref().map(Gender::parse).unwrap_or_default())
            .with_factors(factors);
        for (surface, share) in self.surface_preferences {
            profile = profile.with_surface_preference(Surface::parse(&surface), share);
        }
        profile.elo_overall = self.elo_rating;
        Ok(profile)
    }
}

impl PlayerProfileStore {
    pub fn new() -> Self {
        PlayerProfileStore::default()
    }

    /// Build a store from a JSON object mapping player names to stat records.
    pub fn from_profiles_json(json: &str) -> Result<Self, StoreError> {
        let records: HashMap<String, ProfileRecord> = serde_json::from_str(json)?;
        let mut store = PlayerProfileStore::new();
        for (name, record) in records {
            let profile = record.into_profile(name)?;
            store.insert_profile(profile);
        }
        info!(players = store.profiles.len(), "loaded player profiles");
        Ok(store)
    }

    /// Read a calculated-stats JSON snapshot from disk.
    pub fn load_profiles(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        PlayerProfileStore::from_profiles_json(&json)
    }

    /// Read a tab-delimited ELO table from disk and merge it into this store.
    ///
    /// Returns the number of ratings loaded.
    pub fn load_elo_file(&mut self, path: impl AsRef<Path>) -> Result<usize, StoreError> {
        let file = File::open(path.as_ref())?;
        self.load_elo_tsv(BufReader::new(file))
    }

    /// Merge a tab-delimited ELO table into this store.
    ///
    /// The header must name `Player` and `Elo` columns; `hElo`, `cElo` and
    /// `gElo` surface columns are optional. Rows missing a name or overall
    /// rating are skipped.
    pub fn load_elo_tsv<R: BufRead>(&mut self, reader: R) -> Result<usize, StoreError> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(StoreError::MissingColumn { column: "Player" }),
        };
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| columns.iter().position(|c| *c == name);

        let player_col = find("Player").ok_or(StoreError::MissingColumn { column: "Player" })?;
        let elo_col = find("Elo").ok_or(StoreError::MissingColumn { column: "Elo" })?;
        let surface_cols: Vec<(Surface, usize)> = [
            (Surface::Hard, "hElo"),
            (Surface::Clay, "cElo"),
            (Surface::Grass, "gElo"),
        ]
        .into_iter()
        .filter_map(|(surface, name)| find(name).map(|col| (surface, col)))
        .collect();

        let mut loaded = 0;
        for (idx, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_number = idx + 2;

            let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
            let name = parts.get(player_col).copied().unwrap_or("");
            let raw_overall = parts.get(elo_col).copied().unwrap_or("");
            if name.is_empty() || raw_overall.is_empty() {
                warn!(line = line_number, "skipping ELO row without player or rating");
                continue;
            }

            let Some(overall) = parse_rating(raw_overall) else {
                warn!(line = line_number, player = name, value = raw_overall, "skipping ELO row with unparseable rating");
                continue;
            };
            let mut by_surface = HashMap::new();
            let mut bad_value = None;
            for &(surface, col) in &surface_cols {
                match parts.get(col).copied() {
                    Some(value) if !value.is_empty() => match parse_rating(value) {
                        Some(rating) => {
                            by_surface.insert(surface, rating);
                        }
                        None => {
                            bad_value = Some(value);
                            break;
                        }
                    },
                    _ => {}
                }
            }
            if let Some(value) = bad_value {
                warn!(line = line_number, player = name, value, "skipping ELO row with unparseable rating");
                continue;
            }

            self.insert_elo(name, overall, by_surface);
            loaded += 1;
        }

        info!(
            loaded,
            hard = self.surface_rating_count(Surface::Hard),
            clay = self.surface_rating_count(Surface::Clay),
            grass = self.surface_rating_count(Surface::Grass),
            "loaded ELO ratings"
        );
        Ok(loaded)
    }

    /// Add or replace a profile.
    pub fn insert_profile(&mut self, profile: PlayerProfile) {
        let mut profile = profile;
        if let Some(record) = self.elo_only.remove(&profile.name) {
            profile.elo_overall = Some(record.overall);
            profile.elo_by_surface.extend(record.by_surface);
        }
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Copy of this store with one profile added or replaced.
    pub fn with_profile(&self, profile: PlayerProfile) -> Self {
        let mut store = self.clone();
        store.insert_profile(profile);
        store
    }

    fn insert_elo(&mut self, name: &str, overall: f64, by_surface: HashMap<Surface, f64>) {
        if let Some(profile) = self.profiles.get_mut(name) {
            profile.elo_overall = Some(overall);
            profile.elo_by_surface.extend(by_surface);
        } else {
            self.elo_only
                .insert(name.to_string(), EloRecord { overall, by_surface });
        }
    }

    fn surface_rating_count(&self, surface: Surface) -> usize {
        let with_profile = self
            .profiles
            .values()
            .filter(|p| p.elo_by_surface.contains_key(&surface))
            .count();
        let elo_only = self
            .elo_only
            .values()
            .filter(|r| r.by_surface.contains_key(&surface))
            .count();
        with_profile + elo_only
    }

    pub fn profile(&self, name: &str) -> Option<&PlayerProfile> {
        self.profiles.get(name)
    }

    pub fn player_exists(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Names of all players with a statistical profile, sorted.
    pub fn players(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Surface weight for a player, based on how much they have played on `surface`.
    pub fn surface_weight(&self, name: &str, surface: Surface) -> f64 {
        let matches = self
            .profiles
            .get(name)
            .map(|p| p.surface_matches(surface))
            .unwrap_or(0);
        surface_weight(matches)
    }

    /// Rates for a player on a surface.
    ///
    /// Known players get their baseline blended toward surface-typical rates;
    /// unknown players get rates synthesized from ELO.
    pub fn get_player_stats(&self, name: &str, surface: Surface) -> StatProfile {
        match self.profiles.get(name) {
            Some(profile) => {
                let weight = surface_weight(profile.surface_matches(surface));
                profile.stats.surface_weighted(surface.stat_multipliers(), weight)
            }
            None => {
                let elo = self.get_player_elo(name, Some(surface));
                debug!(player = name, elo = ?elo, "no profile, synthesizing rates");
                StatProfile::from_elo(elo)
            }
        }
    }

    /// ELO for a player, optionally surface-weighted.
    ///
    /// A surface rating is blended with the overall rating using the same
    /// weight as the stats. Missing surface ratings fall back to overall;
    /// missing overall ratings yield `None`.
    pub fn get_player_elo(&self, name: &str, surface: Option<Surface>) -> Option<f64> {
        if let Some(profile) = self.profiles.get(name) {
            let overall = profile.elo_overall?;
            let Some(surface) = surface else {
                return Some(overall);
            };
            return match profile.elo_by_surface.get(&surface) {
                Some(&surface_elo) => {
                    let weight = surface_weight(profile.surface_matches(surface));
                    Some(weight * surface_elo + (1.0 - weight) * overall)
                }
                None => Some(overall),
            };
        }

        let record = self.elo_only.get(name)?;
        // No stats to weight against, so the surface rating is used as is
        Some(
            surface
                .and_then(|s| record.by_surface.get(&s).copied())
                .unwrap_or(record.overall),
        )
    }

    /// Calibrated factors for a player, or neutral factors when unknown.
    pub fn factors(&self, name: &str) -> CalibratedFactors {
        self.profiles
            .get(name)
            .map(|p| p.factors)
            .unwrap_or_default()
    }
}

fn parse_rating(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ELO_TSV: &str = "Rank\tPlayer\tElo\thElo\tcElo\tgElo\n\
        1\tAlpha\t2200\t2180\t2250\t\n\
        2\tBeta\t1900\t1880\t\t1950\n\
        3\t\t1800\t\t\t\n\
        4\tGamma\t1700\t\t\t\n";

    fn profile_json() -> &'static str {
        r#"{
            "Alpha": {
                "ace_rate": 9.0, "double_fault_rate": 2.5, "first_serve_percentage": 65.0,
                "service_points_won": 68.0, "return_points_won": 40.0,
                "matches": 40, "gender": "M",
                "surface_preferences": {"Clay": 0.5, "Hard": 0.4, "Grass": 0.1},
                "clutch_factor": 1.2, "rally_type": "Grinder", "endurance_factor": 0.8
            },
            "Delta": {
                "ace_rate": 3.0, "double_fault_rate": 5.0, "first_serve_percentage": 58.0,
                "service_points_won": 55.0, "return_points_won": 42.0,
                "matches": 8, "gender": "W"
            }
        }"#
    }

    fn make_store() -> PlayerProfileStore {
        let mut store = PlayerProfileStore::from_profiles_json(profile_json()).unwrap();
        store.load_elo_tsv(Cursor::new(ELO_TSV)).unwrap();
        store
    }

    #[test]
    fn test_profiles_loaded() {
        let store = make_store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.players(), vec!["Alpha".to_string(), "Delta".to_string()]);

        let alpha = store.profile("Alpha").unwrap();
        assert_eq!(alpha.factors.clutch, 1.2);
        assert_eq!(alpha.factors.rally_type, RallyType::Grinder);
        assert_eq!(alpha.factors.fatigue_resistance, 0.8);
        assert_eq!(store.profile("Delta").unwrap().gender, Gender::Women);
    }

    #[test]
    fn test_elo_rows_counted_and_skipped() {
        let mut store = PlayerProfileStore::new();
        let loaded = store.load_elo_tsv(Cursor::new(ELO_TSV)).unwrap();
        // Row without a player name is skipped
        assert_eq!(loaded, 3);
    }

    #[test]
    fn test_missing_column_is_error() {
        let mut store = PlayerProfileStore::new();
        let err = store.load_elo_tsv(Cursor::new("Player\tRank\nA\t1\n")).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { column: "Elo" }));
    }

    #[test]
    fn test_unparseable_rating_row_skipped() {
        let mut store = PlayerProfileStore::new();
        let tsv = "Player\tElo\tcElo\nAlpha\t2100\t\nBeta\tN/A\t\nGamma\t1800\t\nDelta\t1750\tclay\n";
        let loaded = store.load_elo_tsv(Cursor::new(tsv)).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.get_player_elo("Alpha", None), Some(2100.0));
        assert_eq!(store.get_player_elo("Beta", None), None);
        assert_eq!(store.get_player_elo("Gamma", None), Some(1800.0));
        // A bad surface rating drops the whole row
        assert_eq!(store.get_player_elo("Delta", None), None);
    }

    #[test]
    fn test_invalid_profile_rate_rejected() {
        let err = PlayerProfileStore::from_profiles_json(r#"{"X": {"ace_rate": -1.0}}"#).unwrap_err();
        assert!(matches!(err, StoreError::InvalidProfile { field: "ace_rate", .. }));
    }

    #[test]
    fn test_surface_weighted_elo() {
        let store = make_store();
        // Alpha: 40 matches * 0.5 on clay = 20 -> weight 0.7
        let clay = store.get_player_elo("Alpha", Some(Surface::Clay)).unwrap();
        assert!((clay - (0.7 * 2250.0 + 0.3 * 2200.0)).abs() < 1e-9);

        // Alpha has no grass rating -> overall
        assert_eq!(store.get_player_elo("Alpha", Some(Surface::Grass)), Some(2200.0));
        assert_eq!(store.get_player_elo("Alpha", None), Some(2200.0));

        // Delta has a profile but no ELO
        assert_eq!(store.get_player_elo("Delta", Some(Surface::Hard)), None);
    }

    #[test]
    fn test_elo_only_player_uses_surface_rating() {
        let store = make_store();
        assert_eq!(store.get_player_elo("Beta", Some(Surface::Grass)), Some(1950.0));
        assert_eq!(store.get_player_elo("Beta", Some(Surface::Clay)), Some(1900.0));
        assert_eq!(store.get_player_elo("Nobody", Some(Surface::Clay)), None);
    }

    #[test]
    fn test_known_player_stats_are_surface_weighted() {
        let store = make_store();
        let clay = store.get_player_stats("Alpha", Surface::Clay);
        let hard = store.get_player_stats("Alpha", Surface::Hard);
        assert!(clay.ace_rate < hard.ace_rate);
        // Hard multipliers are neutral
        assert!((hard.ace_rate - 9.0).abs() < 1e-9);

        // Delta: 8 matches * 0.33 = 2 on grass -> weight 0.3
        let grass = store.get_player_stats("Delta", Surface::Grass);
        assert!((grass.ace_rate - (0.3 * 3.0 * 1.15 + 0.7 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_player_synthesized_from_elo() {
        let store = make_store();
        let beta = store.get_player_stats("Beta", Surface::Hard);
        let gamma = store.get_player_stats("Gamma", Surface::Hard);
        assert!(beta.service_points_won > gamma.service_points_won);

        let unknown = store.get_player_stats("Nobody", Surface::Clay);
        assert_eq!(unknown, StatProfile::league_average());
    }

    #[test]
    fn test_elo_loaded_before_profile_is_attached() {
        let mut store = PlayerProfileStore::new();
        store.load_elo_tsv(Cursor::new(ELO_TSV)).unwrap();
        store.insert_profile(PlayerProfile::new("Gamma", StatProfile::league_average()));
        assert_eq!(store.profile("Gamma").unwrap().elo_overall, Some(1700.0));
    }

    #[test]
    fn test_with_profile_leaves_source_store_untouched() {
        let store = make_store();
        let patched = store.with_profile(PlayerProfile::new("Epsilon", StatProfile::league_average()));
        assert!(patched.player_exists("Epsilon"));
        assert!(!store.player_exists("Epsilon"));
    }
}
