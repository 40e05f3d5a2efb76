use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Upper bound on simulated clients; ids are dense indices into the client table.
pub const MAX_CLIENTS: u16 = 256;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CoherenceConfig {
    #[serde(default = "defaults::clients")]
    pub clients: u16,
    /// Local demands the request source issues before the run drains.
    #[serde(default = "defaults::demands")]
    pub demands: u64,
    #[serde(default = "defaults::seed")]
    pub seed: u64,
    #[serde(default)]
    pub scheduler: SchedulerKind,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::check_invariants")]
    pub check_invariants: bool,
    /// Hard stop on deliveries, so a livelock shows up as an error instead of a hang.
    #[serde(default = "defaults::max_steps")]
    pub max_steps: u64,
}

/// How the runtime picks the next actor to service.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerKind {
    #[default]
    Random,
    RoundRobin,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown scheduler '{0}', expected 'random' or 'round-robin'")]
    UnknownScheduler(String),
}

mod defaults {
    pub fn clients() -> u16 {
        3
    }

    pub fn demands() -> u64 {
        1_000
    }

    pub fn seed() -> u64 {
        0
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn check_invariants() -> bool {
        true
    }

    pub fn max_steps() -> u64 {
        1_000_000
    }
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            clients: defaults::clients(),
            demands: defaults::demands(),
            seed: defaults::seed(),
            scheduler: SchedulerKind::default(),
            log_level: defaults::log_level(),
            check_invariants: defaults::check_invariants(),
            max_steps: defaults::max_steps(),
        }
    }
}

impl CoherenceConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&toml_to_str)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: CoherenceConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clients == 0 {
            return Err(ConfigError::Invalid("at least one client is required".into()));
        }
        if self.clients > MAX_CLIENTS {
            return Err(ConfigError::Invalid(format!(
                "{} clients exceeds the maximum of {MAX_CLIENTS}",
                self.clients
            )));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("max_steps must be positive".into()));
        }
        Ok(())
    }
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SchedulerKind::Random),
            "round-robin" | "round_robin" => Ok(SchedulerKind::RoundRobin),
            other => Err(ConfigError::UnknownScheduler(other.to_string())),
        }
    }
}
