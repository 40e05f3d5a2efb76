mod actor;
mod error;
pub mod invariants;
mod scheduler;
mod simulation;
mod source;
mod stats;
mod system;
mod trace;

pub use actor::Actor;
pub use error::EngineError;
pub use invariants::InvariantViolation;
pub use scheduler::{Participant, RandomScheduler, RoundRobinScheduler, Scheduler};
pub use simulation::{Simulation, SimulationReport};
pub use source::RequestSource;
pub use stats::SimulationStats;
pub use system::{CoherenceSystem, HOST_ID};
pub use trace::{Outcome, TraceEntry, TracedMessage};
