pub mod gaussian;
pub mod matchmaker;
pub mod rating;
pub mod simulation;
pub mod types;

pub use simulation::Simulation;
pub use types::*;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse_config(config_json: &str) -> Result<SimulationConfig, JsValue> {
    SimulationConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(feature = "debug", target_arch = "wasm32"))]
fn log_day(snapshot: &DaySnapshot, stats: &DayStats) {
    web_sys::console::log_1(&JsValue::from_str(&format!(
        "day {}: {} matches, {} skipped, {} upsets",
        snapshot.day, stats.realized, stats.skipped, stats.upsets
    )));
}

#[cfg(not(all(feature = "debug", target_arch = "wasm32")))]
fn log_day(_snapshot: &DaySnapshot, _stats: &DayStats) {}

/// WASM-exposed simulation wrapper
#[wasm_bindgen]
pub struct SimulationEngine {
    sim: Simulation,
}

impl SimulationEngine {
    fn from_simulation(mut sim: Simulation) -> SimulationEngine {
        sim.generate_population(sim.config.population_size);
        SimulationEngine { sim }
    }
}

#[wasm_bindgen]
impl SimulationEngine {
    /// Create a new simulation with default config and a generated population
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> SimulationEngine {
        SimulationEngine {
            sim: Simulation::with_population(SimulationConfig::default(), seed),
        }
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<SimulationEngine, JsValue> {
        let config = parse_config(config_json)?;
        Ok(SimulationEngine {
            sim: Simulation::with_population(config, seed),
        })
    }

    /// Create with default config and an unpredictable seed
    pub fn new_unseeded() -> SimulationEngine {
        Self::from_simulation(Simulation::from_entropy(SimulationConfig::default()))
    }

    /// Simulate one day; returns `{ "day": n, "histogram": [...] }`
    pub fn advance_day(&mut self) -> String {
        let snapshot = self.sim.advance_day();
        log_day(&snapshot, &self.sim.stats.last_day);
        serde_json::to_string(&snapshot).unwrap_or_default()
    }

    /// Simulate several days, returning only the final snapshot
    pub fn run(&mut self, days: u64) -> String {
        match self.sim.run(days) {
            Some(snapshot) => serde_json::to_string(&snapshot).unwrap_or_default(),
            None => serde_json::to_string(&DaySnapshot {
                day: self.sim.current_day,
                histogram: self.sim.histogram(),
            })
            .unwrap_or_default(),
        }
    }

    /// Get current day
    pub fn get_day(&self) -> u64 {
        self.sim.current_day
    }

    /// Get the seed this run was started from
    pub fn get_seed(&self) -> u64 {
        self.sim.seed()
    }

    /// Get total players
    pub fn get_total_players(&self) -> usize {
        self.sim.players.len()
    }

    /// Current histogram as a JSON array
    pub fn get_histogram(&self) -> String {
        serde_json::to_string(&self.sim.histogram()).unwrap_or_default()
    }

    /// Current histogram as a typed array for drawing
    pub fn histogram_values(&self) -> js_sys::Float64Array {
        let values: Vec<f64> = self.sim.histogram().iter().map(|&v| v as f64).collect();
        js_sys::Float64Array::from(values.as_slice())
    }

    /// Get statistics JSON
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.sim.stats).unwrap_or_default()
    }

    /// Get population summary JSON
    pub fn get_population_summary(&self) -> String {
        serde_json::to_string(&self.sim.population_summary()).unwrap_or_default()
    }

    /// Get current simulation state as JSON
    pub fn get_state(&self) -> String {
        self.sim.get_state_json()
    }

    /// Reset statistics (keep population)
    pub fn reset_stats(&mut self) {
        self.sim.stats = SimulationStats::default();
    }

    /// Update simulation config; takes effect from the next day
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = parse_config(config_json)?;
        self.sim.update_config(config);
        Ok(())
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&SimulationConfig::default()).unwrap_or_default()
    }
}

/// Apply one sweep value to a config. Unknown names are rejected.
fn set_parameter(config: &mut SimulationConfig, parameter: &str, value: f64) -> Result<(), String> {
    match parameter {
        "daily_matches" => config.daily_matches = value.max(0.0) as usize,
        "population_size" => config.population_size = value.max(0.0) as usize,
        "start_rating" => config.start_rating = value as i32,
        "gap_threshold" => config.rating_policy.gap_threshold = value as i32,
        "ability_mean" => config.ability.mean = value,
        "ability_std" => config.ability.std = value,
        "max_ability_mean" => config.max_ability.mean = value,
        "max_ability_std" => config.max_ability.std = value,
        "inconsistency_mean" => config.inconsistency.mean = value,
        "inconsistency_std" => config.inconsistency.std = value,
        "evolution_rate_mean" => config.evolution_rate.mean = value,
        "evolution_rate_std" => config.evolution_rate.std = value,
        "evolution_variation_mean" => config.evolution_variation.mean = value,
        "evolution_variation_std" => config.evolution_variation.std = value,
        _ => return Err(format!("Unknown parameter: {}", parameter)),
    }
    Ok(())
}

/// Sweep one parameter, running a fresh simulation per value
pub fn sweep(
    base_config: &SimulationConfig,
    parameter: &str,
    values: &[f64],
    days: u64,
    seed: u64,
) -> Result<Vec<serde_json::Value>, String> {
    let mut results = Vec::new();

    for (i, &value) in values.iter().enumerate() {
        let mut config = base_config.clone();
        set_parameter(&mut config, parameter, value)?;
        config.validate().map_err(|e| e.to_string())?;

        let mut sim = Simulation::with_population(config, simulation::derive_seed(seed, i as u64));
        sim.run(days);

        results.push(serde_json::json!({
            "parameter_value": value,
            "day": sim.current_day,
            "histogram": sim.histogram(),
            "summary": sim.population_summary(),
            "totals": sim.stats.totals,
        }));
    }

    Ok(results)
}

/// Run a parameter sweep experiment
#[wasm_bindgen]
pub fn run_experiment(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    days: u64,
    seed: u64,
) -> Result<String, JsValue> {
    let base_config = parse_config(base_config_json)?;

    let values: Vec<f64> = serde_json::from_str(values_json)
        .map_err(|e| JsValue::from_str(&format!("Values parse error: {}", e)))?;

    let results = sweep(&base_config, parameter, &values, days, seed)
        .map_err(|e| JsValue::from_str(&e))?;

    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
