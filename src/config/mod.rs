use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Which data layer implementation to run against.
///
/// `Remote` is reserved for the future real API and is rejected at startup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mock,
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// "memory" or "file"
    pub driver: String,
    /// File path for the "file" driver
    pub path: String,
    /// Key prefix, e.g. "microcollab" -> "microcollab:requests"
    pub namespace: String,
    /// Byte budget for the memory driver; writes past it fail like a full
    /// browser quota. Unset means unlimited.
    pub quota_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LatencyConfig {
    pub enabled: bool,
    pub read_min_ms: u64,
    pub read_max_ms: u64,
    pub write_min_ms: u64,
    pub write_max_ms: u64,
    pub delete_min_ms: u64,
    pub delete_max_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Seed the store on startup when it is empty
    pub auto: bool,
    pub users: usize,
    pub requests: usize,
    pub offers: usize,
    pub sessions: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub tick_seconds: u64,
    pub request_weight: u32,
    pub offer_weight: u32,
    pub session_start_weight: u32,
    pub session_complete_weight: u32,
    pub min_seed_requests: usize,
    pub max_seed_requests: usize,
    pub max_seed_offers_per_request: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub backend: Backend,
    pub storage: StorageConfig,
    pub latency: LatencyConfig,
    pub seed: SeedConfig,
    pub simulation: SimulationConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("backend", "mock")?
            .set_default("storage.driver", "memory")?
            .set_default("storage.path", "microcollab-data.json")?
            .set_default("storage.namespace", "microcollab")?
            .set_default("latency.enabled", true)?
            .set_default("latency.read_min_ms", 80)?
            .set_default("latency.read_max_ms", 150)?
            .set_default("latency.write_min_ms", 150)?
            .set_default("latency.write_max_ms", 250)?
            .set_default("latency.delete_min_ms", 100)?
            .set_default("latency.delete_max_ms", 200)?
            .set_default("seed.auto", true)?
            .set_default("seed.users", 10)?
            .set_default("seed.requests", 20)?
            .set_default("seed.offers", 15)?
            .set_default("seed.sessions", 5)?
            .set_default("simulation.tick_seconds", 45)?
            .set_default("simulation.request_weight", 40)?
            .set_default("simulation.offer_weight", 35)?
            .set_default("simulation.session_start_weight", 15)?
            .set_default("simulation.session_complete_weight", 10)?
            .set_default("simulation.min_seed_requests", 10)?
            .set_default("simulation.max_seed_requests", 15)?
            .set_default("simulation.max_seed_offers_per_request", 3)?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_SIMULATION__TICK_SECONDS=5` sets `Settings.simulation.tick_seconds`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("backend", "mock")?
            .set_default("storage.driver", "memory")?
            .set_default("storage.path", "microcollab-test.json")?
            .set_default("storage.namespace", "microcollab")?
            .set_default("latency.enabled", false)?
            .set_default("latency.read_min_ms", 0)?
            .set_default("latency.read_max_ms", 0)?
            .set_default("latency.write_min_ms", 0)?
            .set_default("latency.write_max_ms", 0)?
            .set_default("latency.delete_min_ms", 0)?
            .set_default("latency.delete_max_ms", 0)?
            .set_default("seed.auto", false)?
            .set_default("seed.users", 4)?
            .set_default("seed.requests", 6)?
            .set_default("seed.offers", 4)?
            .set_default("seed.sessions", 2)?
            .set_default("simulation.tick_seconds", 1)?
            .set_default("simulation.request_weight", 40)?
            .set_default("simulation.offer_weight", 35)?
            .set_default("simulation.session_start_weight", 15)?
            .set_default("simulation.session_complete_weight", 10)?
            .set_default("simulation.min_seed_requests", 3)?
            .set_default("simulation.max_seed_requests", 5)?
            .set_default("simulation.max_seed_offers_per_request", 2)?
            .build()?
            .try_deserialize()
    }
}
