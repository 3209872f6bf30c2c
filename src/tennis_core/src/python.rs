use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::sync::Arc;

use crate::config::SimulationConfig;
use crate::constants::{MINUTES_PER_GAME, SLATE_PERCENTILES};
use crate::context::Side;
use crate::fantasy::{self, FantasyStats};
use crate::simulator::MatchSimulator;
use crate::slate::{Matchup, SlateSimulator};
use crate::store::PlayerProfileStore;
use crate::surface::Surface;

fn value_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Match and slate simulator over a fixed profile store and config.
#[pyclass(name = "Simulator")]
pub struct PySimulator {
    slate: SlateSimulator,
    simulator: MatchSimulator,
}

#[pymethods]
impl PySimulator {
    #[new]
    #[pyo3(signature = (profiles_json = None, elo_files = Vec::new(), config_json = None))]
    fn new(profiles_json: Option<&str>, elo_files: Vec<String>, config_json: Option<&str>) -> PyResult<Self> {
        let mut store = match profiles_json {
            Some(json) => PlayerProfileStore::from_profiles_json(json).map_err(value_error)?,
            None => PlayerProfileStore::new(),
        };
        for path in &elo_files {
            store.load_elo_file(path).map_err(value_error)?;
        }
        let config = match config_json {
            Some(json) => SimulationConfig::from_json_str(json).map_err(value_error)?,
            None => SimulationConfig::default(),
        };

        let simulator = MatchSimulator::new(Arc::new(store), Arc::new(config)).map_err(value_error)?;
        Ok(PySimulator {
            slate: SlateSimulator::new(simulator.clone()),
            simulator,
        })
    }

    /// Simulate one match.
    ///
    /// Returns (player1 fantasy points, player2 fantasy points, winner, score line).
    #[pyo3(signature = (player1, player2, surface = "Hard", best_of_5 = false, use_variance = true, seed = None))]
    fn simulate_match(
        &self,
        player1: &str,
        player2: &str,
        surface: &str,
        best_of_5: bool,
        use_variance: bool,
        seed: Option<u64>,
    ) -> (f64, f64, String, String) {
        let result = self.simulator.simulate_match(
            player1,
            player2,
            Surface::parse(surface),
            best_of_5,
            use_variance,
            seed,
        );
        let winner = match result.winner {
            Side::Player1 => player1,
            Side::Player2 => player2,
        };
        (
            result.fantasy_points(Side::Player1, best_of_5),
            result.fantasy_points(Side::Player2, best_of_5),
            winner.to_string(),
            result.score_line(),
        )
    }

    /// Simulate one match and return the full result as JSON.
    #[pyo3(signature = (player1, player2, surface = "Hard", best_of_5 = false, use_variance = true, seed = None))]
    fn simulate_match_json(
        &self,
        player1: &str,
        player2: &str,
        surface: &str,
        best_of_5: bool,
        use_variance: bool,
        seed: Option<u64>,
    ) -> PyResult<String> {
        let result = self.simulator.simulate_match(
            player1,
            player2,
            Surface::parse(surface),
            best_of_5,
            use_variance,
            seed,
        );
        serde_json::to_string(&result).map_err(value_error)
    }

    #[pyo3(signature = (player1, player2, surface = "Hard"))]
    fn elo_win_probability(&self, player1: &str, player2: &str, surface: &str) -> Option<f64> {
        self.simulator
            .elo_win_probability(player1, player2, Surface::parse(surface))
    }

    /// Run a slate of (player1, player2, surface, best_of_5) matchups and return the report as JSON.
    #[pyo3(signature = (matchups, trials, seed = None))]
    fn run_slate(
        &self,
        py: Python<'_>,
        matchups: Vec<(String, String, String, bool)>,
        trials: usize,
        seed: Option<u64>,
    ) -> PyResult<String> {
        let matchups: Vec<Matchup> = matchups
            .into_iter()
            .map(|(p1, p2, surface, bo5)| Matchup::new(p1, p2, Surface::parse(&surface), bo5))
            .collect();
        let report = py.allow_threads(|| self.slate.run(&matchups, trials, seed));
        report.to_json().map_err(value_error)
    }

    fn player_exists(&self, name: &str) -> bool {
        self.simulator.store().player_exists(name)
    }

    fn __repr__(&self) -> String {
        format!("Simulator({} players)", self.simulator.store().len())
    }
}

/// Fantasy points for a stat line.
#[pyfunction]
#[pyo3(signature = (
    match_won,
    sets_won,
    sets_lost,
    games_won,
    games_lost,
    aces = 0,
    double_faults = 0,
    breaks = 0,
    clean_sets = 0,
    best_of_5 = false
))]
#[allow(clippy::too_many_arguments)]
fn fantasy_points(
    match_won: bool,
    sets_won: u32,
    sets_lost: u32,
    games_won: u32,
    games_lost: u32,
    aces: u32,
    double_faults: u32,
    breaks: u32,
    clean_sets: u32,
    best_of_5: bool,
) -> f64 {
    let mut stats = FantasyStats {
        sets_won,
        sets_lost,
        games_won,
        games_lost,
        aces,
        double_faults,
        breaks,
        clean_sets,
        ..FantasyStats::default()
    };
    stats.finalize_match(match_won);
    fantasy::fantasy_points(&stats, best_of_5)
}

/// Python module definition
#[pymodule]
fn tennis_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulator>()?;
    m.add_function(wrap_pyfunction!(fantasy_points, m)?)?;

    m.add("MINUTES_PER_GAME", MINUTES_PER_GAME)?;
    m.add("SLATE_PERCENTILES", SLATE_PERCENTILES.to_vec())?;
    m.add("SURFACES", Surface::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>())?;

    Ok(())
}
