use crate::error::EngineError;
use crate::scheduler::{Participant, RandomScheduler, RoundRobinScheduler, Scheduler};
use crate::source::RequestSource;
use crate::stats::SimulationStats;
use crate::system::CoherenceSystem;
use crate::trace::TraceEntry;
use coherence_config::{CoherenceConfig, SchedulerKind};
use coherence_events::ClientId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

/// Final state of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub stats: SimulationStats,
    pub sharers: Vec<ClientId>,
    pub exclusive_granted: bool,
    /// Empty unless the run was built with [`Simulation::with_trace`].
    #[serde(skip)]
    pub trace: Vec<TraceEntry>,
}

/// Drives a [`CoherenceSystem`] with a request source until a demand budget is
/// spent and every message has settled.
///
/// The request source is just another participant: while demands remain it
/// is offered to the scheduler alongside the actors, so demands interleave
/// with protocol traffic.
pub struct Simulation<R, S> {
    system: CoherenceSystem,
    source: RequestSource<R>,
    scheduler: S,
    remaining: u64,
    max_steps: u64,
    ready: Vec<Participant>,
}

impl<R: Rng, S: Scheduler> Simulation<R, S> {
    pub fn new(
        system: CoherenceSystem,
        source: RequestSource<R>,
        scheduler: S,
        demands: u64,
    ) -> Self {
        Self {
            system,
            source,
            scheduler,
            remaining: demands,
            max_steps: u64::MAX,
            ready: Vec::new(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Keeps every offered message for [`SimulationReport::trace`].
    pub fn with_trace(mut self) -> Self {
        self.system = self.system.with_trace();
        self
    }

    pub fn system(&self) -> &CoherenceSystem {
        &self.system
    }

    pub fn remaining_demands(&self) -> u64 {
        self.remaining
    }

    /// Gives one participant a turn. Returns `false` once there is nothing
    /// left to do.
    pub fn step(&mut self) -> Result<bool, EngineError> {
        let steps = self.system.stats().steps + self.system.stats().demands_issued;
        if steps >= self.max_steps {
            return Err(EngineError::StepLimit { steps });
        }

        self.ready.clear();
        if self.remaining > 0 {
            self.ready.push(Participant::Source);
        }
        self.system.ready(&mut self.ready);
        if self.ready.is_empty() {
            return Ok(false);
        }

        match self.ready[self.scheduler.pick(&self.ready)] {
            Participant::Source => {
                let demand = self.source.next_demand();
                self.system.demand(demand)?;
                self.remaining -= 1;
            }
            actor => {
                self.system.deliver(actor)?;
            }
        }
        Ok(true)
    }

    /// Runs to completion and checks the settled system.
    pub fn run(mut self) -> Result<SimulationReport, EngineError> {
        while self.step()? {}

        if !self.system.is_quiescent() {
            return Err(EngineError::Stalled {
                stashed: self.system.stashed(),
            });
        }
        self.system.check_quiescent()?;

        let host = self.system.host();
        let report = SimulationReport {
            stats: *self.system.stats(),
            sharers: host.sharers().collect(),
            exclusive_granted: host.exclusive_granted(),
            trace: self.system.trace().to_vec(),
        };
        info!(
            steps = report.stats.steps,
            demands = report.stats.demands_issued,
            grants = report.stats.grants(),
            invalidations = report.stats.invalidations_sent,
            "simulation finished"
        );
        Ok(report)
    }
}

impl Simulation<StdRng, Box<dyn Scheduler>> {
    /// Builds a seeded simulation. The request source and the random
    /// scheduler draw from separate streams derived from `config.seed`.
    pub fn from_config(config: &CoherenceConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let system =
            CoherenceSystem::new(config.clients)?.with_invariant_checks(config.check_invariants);
        let source = RequestSource::new(system.client_ids(), StdRng::seed_from_u64(config.seed))?;
        let scheduler: Box<dyn Scheduler> = match config.scheduler {
            SchedulerKind::Random => Box::new(RandomScheduler::seeded(scheduler_seed(config.seed))),
            SchedulerKind::RoundRobin => Box::new(RoundRobinScheduler::new()),
        };
        Ok(Simulation::new(system, source, scheduler, config.demands)
            .with_max_steps(config.max_steps))
    }
}

fn scheduler_seed(seed: u64) -> u64 {
    seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15
}
