mod config;

pub use config::{CoherenceConfig, ConfigError, MAX_CLIENTS, SchedulerKind};
