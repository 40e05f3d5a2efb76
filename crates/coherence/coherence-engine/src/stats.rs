use serde::Serialize;

/// Counters collected from delivery outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Messages offered to an actor, including re-offers from the stash.
    pub steps: u64,
    pub demands_issued: u64,
    pub deferrals: u64,
    pub ignored: u64,
    pub requests: u64,
    pub invalidations_sent: u64,
    pub acks_received: u64,
    pub shared_grants: u64,
    pub exclusive_grants: u64,
}

impl SimulationStats {
    pub fn grants(&self) -> u64 {
        self.shared_grants + self.exclusive_grants
    }
}
