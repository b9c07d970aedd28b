pub mod app_config;
pub mod memory;

pub use app_config::{Config, Fixtures, LogConfig, SweepConfig};
pub use memory::InMemoryStore;
