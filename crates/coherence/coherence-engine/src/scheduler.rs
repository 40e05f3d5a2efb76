//! Choice of which actor runs next.
//!
//! Interleaving is the only nondeterminism besides the request source, so it
//! sits behind a trait: a checker can drive the system through any order it
//! wants, the simulation uses a seeded random pick.

use coherence_events::ClientId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Anything the runtime can give a turn to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    /// The request source issuing one demand.
    Source,
    Host,
    Client(ClientId),
}

pub trait Scheduler {
    /// Returns an index into `ready`, which is never empty and is sorted.
    fn pick(&mut self, ready: &[Participant]) -> usize;
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn pick(&mut self, ready: &[Participant]) -> usize {
        (**self).pick(ready)
    }
}

/// Uniform pick among ready participants.
#[derive(Debug)]
pub struct RandomScheduler<R> {
    rng: R,
}

impl<R: Rng> RandomScheduler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomScheduler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Scheduler for RandomScheduler<R> {
    fn pick(&mut self, ready: &[Participant]) -> usize {
        self.rng.random_range(0..ready.len())
    }
}

/// Cycles through participants in id order, skipping those with nothing to do.
#[derive(Debug, Default)]
pub struct RoundRobinScheduler {
    last: Option<Participant>,
}

impl RoundRobinScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for RoundRobinScheduler {
    fn pick(&mut self, ready: &[Participant]) -> usize {
        let idx = ready
            .iter()
            .position(|p| Some(*p) > self.last)
            .unwrap_or(0);
        self.last = Some(ready[idx]);
        idx
    }
}
