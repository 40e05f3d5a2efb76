//! In-process runtime hosting one host and N clients.
//!
//! The system owns every actor. A delivery offers exactly one message to one
//! actor, runs it to completion, then routes whatever the actor put in its
//! outbox into the destination mailboxes. Because each actor has one FIFO
//! mailbox, messages from one sender to one receiver keep their send order;
//! messages from different senders interleave however the caller schedules
//! deliveries.

use crate::actor::Actor;
use crate::error::EngineError;
use crate::invariants::{self, InvariantViolation};
use crate::scheduler::{Participant, Scheduler};
use crate::stats::SimulationStats;
use crate::trace::{TraceEntry, TracedMessage};
use coherence_client::Client;
use coherence_events::{ClientId, ClientMessage, Demand, Envelope, HostId, HostMessage};
use coherence_host::{Host, HostState};
use coherence_mailbox::{Delivery, Disposition};
use tracing::{debug, error};

/// The runtime hosts a single arbiter at this address.
pub const HOST_ID: HostId = HostId(0);

#[derive(Debug)]
pub struct CoherenceSystem {
    host: Actor<Host>,
    /// Indexed by `ClientId.0`.
    clients: Vec<Actor<Client>>,
    outbox: Vec<Envelope>,
    stats: SimulationStats,
    check_invariants: bool,
    trace: Option<Vec<TraceEntry>>,
    poisoned: bool,
}

impl CoherenceSystem {
    /// Creates the host and `clients` clients and configures each client.
    pub fn new(clients: u16) -> Result<Self, EngineError> {
        let mut system = Self {
            host: Actor::new(Host::new(HOST_ID)),
            clients: (0..clients).map(|i| Actor::new(Client::new(ClientId(i)))).collect(),
            outbox: Vec::new(),
            stats: SimulationStats::default(),
            check_invariants: true,
            trace: None,
            poisoned: false,
        };
        for i in 0..clients {
            let id = ClientId(i);
            system.post(Envelope::to_client(
                id,
                ClientMessage::Configure {
                    host: HOST_ID,
                    pending: false,
                },
            ))?;
            system.deliver(Participant::Client(id))?;
        }
        // Setup deliveries are not part of a run.
        system.stats = SimulationStats::default();
        Ok(system)
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Records every offered message; see [`CoherenceSystem::trace`].
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn host(&self) -> &Host {
        &self.host.machine
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.0 as usize).map(|a| &a.machine)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> + Clone {
        self.clients.iter().map(|a| &a.machine)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|a| a.machine.id()).collect()
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn trace(&self) -> &[TraceEntry] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Hands a local demand to its client's mailbox.
    pub fn demand(&mut self, demand: Demand) -> Result<(), EngineError> {
        debug!(client = %demand.client, kind = ?demand.kind, "demand");
        self.post(Envelope::to_client(demand.client, demand.message()))?;
        self.stats.demands_issued += 1;
        Ok(())
    }

    /// Actors with a deliverable message, in participant order.
    pub fn ready(&self, out: &mut Vec<Participant>) {
        if self.host.mailbox.has_work() {
            out.push(Participant::Host);
        }
        out.extend(
            self.clients
                .iter()
                .filter(|a| a.mailbox.has_work())
                .map(|a| Participant::Client(a.machine.id())),
        );
    }

    /// Messages deferred across all mailboxes.
    pub fn stashed(&self) -> usize {
        self.host.mailbox.stashed()
            + self
                .clients
                .iter()
                .map(|a| a.mailbox.stashed())
                .sum::<usize>()
    }

    /// Host idle and every mailbox empty.
    pub fn is_quiescent(&self) -> bool {
        self.host.machine.state() == HostState::Receiving
            && self.host.mailbox.is_empty()
            && self.clients.iter().all(|a| a.mailbox.is_empty())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        invariants::check(self.host(), self.clients())
    }

    pub fn check_quiescent(&self) -> Result<(), InvariantViolation> {
        invariants::check_quiescent(self.host(), self.clients())
    }

    /// Offers one message to `to` and routes its output.
    ///
    /// Returns `Ok(None)` when `to` had nothing deliverable. Any error is
    /// fatal: the system refuses every later delivery.
    pub fn deliver(&mut self, to: Participant) -> Result<Option<Disposition>, EngineError> {
        if self.poisoned {
            return Err(EngineError::Poisoned);
        }
        let result = self.deliver_inner(to);
        if let Err(err) = &result {
            error!(?to, %err, "protocol failure");
            self.poisoned = true;
        }
        result
    }

    /// Delivers until nothing is deliverable. Returns the number of deliveries.
    pub fn run_until_quiescent<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        max_steps: u64,
    ) -> Result<u64, EngineError> {
        let mut ready = Vec::new();
        let mut steps = 0u64;
        loop {
            ready.clear();
            self.ready(&mut ready);
            if ready.is_empty() {
                break;
            }
            if steps >= max_steps {
                return Err(EngineError::StepLimit { steps });
            }
            let to = ready[scheduler.pick(&ready)];
            self.deliver(to)?;
            steps += 1;
        }
        if !self.is_quiescent() {
            return Err(EngineError::Stalled {
                stashed: self.stashed(),
            });
        }
        if self.check_invariants {
            self.check_quiescent()?;
        }
        Ok(steps)
    }

    fn deliver_inner(&mut self, to: Participant) -> Result<Option<Disposition>, EngineError> {
        let mut outbox = std::mem::take(&mut self.outbox);
        let (disposition, message) = match to {
            Participant::Source => return Ok(None),
            Participant::Host => {
                let Some(delivery) = self
                    .host
                    .mailbox
                    .deliver(&mut self.host.machine, &mut outbox)?
                else {
                    return Ok(None);
                };
                self.count_host(&delivery);
                (delivery.disposition, TracedMessage::Host(delivery.message))
            }
            Participant::Client(id) => {
                let actor = self
                    .clients
                    .get_mut(id.0 as usize)
                    .ok_or(EngineError::UnknownClient(id))?;
                let Some(delivery) = actor.mailbox.deliver(&mut actor.machine, &mut outbox)? else {
                    return Ok(None);
                };
                (delivery.disposition, TracedMessage::Client(delivery.message))
            }
        };

        self.stats.steps += 1;
        match disposition {
            Disposition::Deferred => self.stats.deferrals += 1,
            Disposition::Ignored => self.stats.ignored += 1,
            Disposition::Transitioned | Disposition::Handled => {}
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceEntry {
                step: self.stats.steps,
                to,
                message,
                outcome: disposition.into(),
            });
        }

        for envelope in outbox.drain(..) {
            self.post(envelope)?;
        }
        self.outbox = outbox;

        if self.check_invariants {
            self.check_invariants()?;
        }
        Ok(Some(disposition))
    }

    fn count_host(&mut self, delivery: &Delivery<HostMessage>) {
        if !delivery.disposition.is_consumed() {
            return;
        }
        match delivery.message {
            HostMessage::ReqShare { .. } | HostMessage::ReqExcl { .. } => self.stats.requests += 1,
            HostMessage::InvalidateAck => self.stats.acks_received += 1,
        }
    }

    fn post(&mut self, envelope: Envelope) -> Result<(), EngineError> {
        match envelope {
            Envelope::Host { host, message } => {
                if host != self.host.machine.id() {
                    return Err(EngineError::UnknownHost(host));
                }
                self.host.mailbox.push(message);
            }
            Envelope::Client { client, message } => {
                let actor = self
                    .clients
                    .get_mut(client.0 as usize)
                    .ok_or(EngineError::UnknownClient(client))?;
                match message {
                    ClientMessage::Invalidate => self.stats.invalidations_sent += 1,
                    ClientMessage::GrantShared => self.stats.shared_grants += 1,
                    ClientMessage::GrantExclusive => self.stats.exclusive_grants += 1,
                    _ => {}
                }
                actor.mailbox.push(message);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coherence_client::ClientState;
    use coherence_events::RequestKind;

    #[test]
    fn new_system_is_configured_and_quiescent() {
        let system = CoherenceSystem::new(3).unwrap();
        assert!(system.is_quiescent());
        assert!(system.clients().all(|c| c.state() == ClientState::Invalid));
        assert_eq!(system.clients().filter(|c| c.host() == Some(HOST_ID)).count(), 3);
        assert_eq!(*system.stats(), SimulationStats::default());
    }

    #[test]
    fn demand_for_unknown_client_is_rejected() {
        let mut system = CoherenceSystem::new(1).unwrap();
        let err = system
            .demand(Demand {
                client: ClientId(5),
                kind: RequestKind::Share,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownClient(ClientId(5))));
    }

    #[test]
    fn empty_mailbox_delivers_nothing() {
        let mut system = CoherenceSystem::new(2).unwrap();
        assert_eq!(system.deliver(Participant::Host).unwrap(), None);
        assert_eq!(
            system.deliver(Participant::Client(ClientId(1))).unwrap(),
            None
        );
        let mut ready = Vec::new();
        system.ready(&mut ready);
        assert!(ready.is_empty());
    }

    #[test]
    fn failure_poisons_the_system() {
        let mut system = CoherenceSystem::new(1).unwrap();
        system
            .post(Envelope::to_client(ClientId(0), ClientMessage::GrantShared))
            .unwrap();
        assert!(matches!(
            system.deliver(Participant::Client(ClientId(0))),
            Err(EngineError::Client(_))
        ));
        assert!(matches!(
            system.deliver(Participant::Host),
            Err(EngineError::Poisoned)
        ));
    }

    #[test]
    fn trace_records_each_offer() {
        let mut system = CoherenceSystem::new(1).unwrap().with_trace();
        system
            .demand(Demand {
                client: ClientId(0),
                kind: RequestKind::Exclusive,
            })
            .unwrap();
        system.deliver(Participant::Client(ClientId(0))).unwrap();
        system.deliver(Participant::Host).unwrap();
        system.deliver(Participant::Client(ClientId(0))).unwrap();

        let steps: Vec<_> = system.trace().iter().map(|e| (e.step, e.to)).collect();
        assert_eq!(
            steps,
            vec![
                (1, Participant::Client(ClientId(0))),
                (2, Participant::Host),
                (3, Participant::Client(ClientId(0))),
            ]
        );
        assert_eq!(
            system.client(ClientId(0)).unwrap().state(),
            ClientState::Exclusive
        );
    }
}
