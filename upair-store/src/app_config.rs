use serde::Deserialize;
use std::env;
use upair_catalog::{FareConfig, LifecycleRules, SeatLayout};
use upair_core::{FlightCatalogEntry, FlightOffer, ScheduleInstance};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub seating: SeatLayout,
    #[serde(default)]
    pub lifecycle: LifecycleRules,
    #[serde(default)]
    pub fares: FareConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub fixtures: Fixtures,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

fn default_filter() -> String {
    "info,upair_catalog=debug,upair_order=debug".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { interval_seconds: default_interval() }
    }
}

fn default_interval() -> u64 {
    60
}

/// Catalog and schedule rows loaded into the in-memory store at start-up.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Fixtures {
    #[serde(default)]
    pub flights: Vec<FlightCatalogEntry>,
    #[serde(default)]
    pub offers: Vec<FlightOffer>,
    #[serde(default)]
    pub schedules: Vec<ScheduleInstance>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `UPAIR__SWEEP__INTERVAL_SECONDS=5`
            .add_source(config::Environment::with_prefix("UPAIR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
