use crate::invariants::InvariantViolation;
use coherence_client::ClientError;
use coherence_config::ConfigError;
use coherence_events::{ClientId, HostId};
use coherence_host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request source needs at least one client")]
    NoClients,

    #[error("no such client: {0}")]
    UnknownClient(ClientId),

    #[error("no such host: {0}")]
    UnknownHost(HostId),

    #[error("no deliverable message while {stashed} remain deferred")]
    Stalled { stashed: usize },

    #[error("gave up after {steps} steps")]
    StepLimit { steps: u64 },

    #[error("system already failed; refusing further deliveries")]
    Poisoned,
}
