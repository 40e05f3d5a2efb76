//! The arbiter.
//!
//! The host owns the authoritative sharer list and the exclusive flag. Both
//! live inside the `Host` value and are only touched from `handle`, so the
//! actor that owns the host is the only code path that can change them.
//!
//! # Request cycle
//!
//! ```text
//! Receiving --Req--> CapturingRequest --> Deciding
//!                                           | share, no exclusive holder
//!                                           |------------------------------> Granting --> Receiving
//!                                           | exclusive, or exclusive held        ^
//!                                           v                                     |
//!                                      Invalidating --(list empty)----------------+
//!                                        ^      |
//!                                        +-Ack--+  pops the head of the list
//! ```
//!
//! Requests arriving while Invalidating are deferred, so at most one cycle is
//! in progress at a time.

use crate::error::HostError;
use crate::state::HostState;
use crate::transition::{Action, dispatch};
use coherence_events::{
    ClientId, ClientMessage, Envelope, HostId, HostMessage, Request, RequestKind,
};
use coherence_mailbox::{Disposition, StateMachine};
use std::collections::VecDeque;
use tracing::{debug, info, trace};

#[derive(Debug, Clone)]
pub struct Host {
    id: HostId,
    state: HostState,
    /// Front is the most recently granted client.
    sharers: VecDeque<ClientId>,
    exclusive_granted: bool,
    current: Option<Request>,
}

impl Host {
    pub fn new(id: HostId) -> Self {
        Self {
            id,
            state: HostState::Receiving,
            sharers: VecDeque::new(),
            exclusive_granted: false,
            current: None,
        }
    }

    #[inline]
    pub fn id(&self) -> HostId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> HostState {
        self.state
    }

    #[inline]
    pub fn exclusive_granted(&self) -> bool {
        self.exclusive_granted
    }

    /// Sharers, most recently granted first.
    pub fn sharers(&self) -> impl ExactSizeIterator<Item = ClientId> + '_ {
        self.sharers.iter().copied()
    }

    #[inline]
    pub fn is_sharer(&self, client: ClientId) -> bool {
        self.sharers.contains(&client)
    }

    /// The request being processed, if a cycle is in progress.
    #[inline]
    pub fn current_request(&self) -> Option<Request> {
        self.current
    }

    /// Acks still expected in the current invalidation cycle.
    pub fn outstanding_acks(&self) -> usize {
        match self.state {
            HostState::Invalidating => self.sharers.len(),
            _ => 0,
        }
    }

    /// Runs epsilon transitions until a resting state is reached.
    fn settle(&mut self, outbox: &mut Vec<Envelope>) -> Result<(), HostError> {
        while !self.state.is_resting() {
            let next = match self.state {
                HostState::CapturingRequest => HostState::Deciding,
                HostState::Deciding => self.decide(outbox)?,
                HostState::Granting => self.grant(outbox)?,
                resting => resting,
            };
            trace!(host = %self.id, from = ?self.state, to = ?next, "host step");
            self.state = next;
        }
        Ok(())
    }

    fn decide(&self, outbox: &mut Vec<Envelope>) -> Result<HostState, HostError> {
        let request = self.current.ok_or(HostError::MissingRequest { state: self.state })?;
        if !(request.kind.is_exclusive() || self.exclusive_granted) {
            return Ok(HostState::Granting);
        }
        if self.sharers.is_empty() {
            return Ok(HostState::Granting);
        }
        debug!(
            host = %self.id,
            requester = %request.requester,
            sharers = self.sharers.len(),
            "invalidating sharers"
        );
        for &client in &self.sharers {
            outbox.push(Envelope::to_client(client, ClientMessage::Invalidate));
        }
        Ok(HostState::Invalidating)
    }

    fn grant(&mut self, outbox: &mut Vec<Envelope>) -> Result<HostState, HostError> {
        let request = self
            .current
            .take()
            .ok_or(HostError::MissingRequest { state: self.state })?;
        if self.sharers.contains(&request.requester) {
            return Err(HostError::DuplicateSharer {
                client: request.requester,
            });
        }

        let message = match request.kind {
            RequestKind::Exclusive => {
                self.exclusive_granted = true;
                ClientMessage::GrantExclusive
            }
            RequestKind::Share => {
                self.exclusive_granted = false;
                ClientMessage::GrantShared
            }
        };
        self.sharers.push_front(request.requester);
        if self.exclusive_granted && self.sharers.len() != 1 {
            return Err(HostError::ExclusiveNotSole {
                sharers: self.sharers.len(),
            });
        }

        info!(
            host = %self.id,
            client = %request.requester,
            kind = ?request.kind,
            sharers = self.sharers.len(),
            "granted"
        );
        outbox.push(Envelope::to_client(request.requester, message));
        Ok(HostState::Receiving)
    }
}

impl StateMachine for Host {
    type Message = HostMessage;
    type Output = Envelope;
    type Error = HostError;

    fn handle(
        &mut self,
        message: HostMessage,
        outbox: &mut Vec<Envelope>,
    ) -> Result<Disposition, HostError> {
        match dispatch(self.state, message) {
            Action::Capture(request) => {
                debug!(
                    host = %self.id,
                    requester = %request.requester,
                    kind = ?request.kind,
                    "request captured"
                );
                self.current = Some(request);
                self.state = HostState::CapturingRequest;
                self.settle(outbox)?;
                Ok(Disposition::Transitioned)
            }
            Action::Ack => {
                // The acking client is not compared with the popped entry;
                // per-sender FIFO delivery keeps the count right.
                let popped = self.sharers.pop_front();
                trace!(host = %self.id, ?popped, remaining = self.sharers.len(), "ack");
                if !self.sharers.is_empty() {
                    return Ok(Disposition::Handled);
                }
                self.state = HostState::Granting;
                self.settle(outbox)?;
                Ok(Disposition::Transitioned)
            }
            Action::Defer => Ok(Disposition::Deferred),
            Action::Illegal => Err(HostError::UnexpectedMessage {
                state: self.state,
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coherence_mailbox::{Mailbox, Origin};

    const HOST: HostId = HostId(0);
    const A: ClientId = ClientId(0);
    const B: ClientId = ClientId(1);
    const C: ClientId = ClientId(2);

    fn send(host: &mut Host, message: HostMessage) -> (Disposition, Vec<Envelope>) {
        let mut out = Vec::new();
        let d = host.handle(message, &mut out).expect("legal message");
        (d, out)
    }

    fn sharers(host: &Host) -> Vec<ClientId> {
        host.sharers().collect()
    }

    #[test]
    fn exclusive_on_empty_list_is_granted_immediately() {
        let mut host = Host::new(HOST);
        let (d, out) = send(&mut host, HostMessage::ReqExcl { requester: A });

        assert_eq!(d, Disposition::Transitioned);
        assert_eq!(out, vec![Envelope::to_client(A, ClientMessage::GrantExclusive)]);
        assert_eq!(sharers(&host), vec![A]);
        assert!(host.exclusive_granted());
        assert_eq!(host.state(), HostState::Receiving);
        assert_eq!(host.current_request(), None);
    }

    #[test]
    fn shares_are_granted_without_invalidation() {
        let mut host = Host::new(HOST);
        send(&mut host, HostMessage::ReqShare { requester: A });
        let (_, out) = send(&mut host, HostMessage::ReqShare { requester: B });

        assert_eq!(out, vec![Envelope::to_client(B, ClientMessage::GrantShared)]);
        assert_eq!(sharers(&host), vec![B, A]);
        assert!(!host.exclusive_granted());
    }

    #[test]
    fn share_after_exclusive_invalidates_holder_first() {
        let mut host = Host::new(HOST);
        send(&mut host, HostMessage::ReqExcl { requester: A });

        let (_, out) = send(&mut host, HostMessage::ReqShare { requester: B });
        assert_eq!(out, vec![Envelope::to_client(A, ClientMessage::Invalidate)]);
        assert_eq!(host.state(), HostState::Invalidating);
        assert_eq!(host.outstanding_acks(), 1);

        let (d, out) = send(&mut host, HostMessage::InvalidateAck);
        assert_eq!(d, Disposition::Transitioned);
        assert_eq!(out, vec![Envelope::to_client(B, ClientMessage::GrantShared)]);
        assert_eq!(sharers(&host), vec![B]);
        assert!(!host.exclusive_granted());
    }

    #[test]
    fn exclusive_waits_for_every_ack() {
        let mut host = Host::new(HOST);
        send(&mut host, HostMessage::ReqShare { requester: A });
        send(&mut host, HostMessage::ReqShare { requester: B });

        let (_, out) = send(&mut host, HostMessage::ReqExcl { requester: C });
        assert_eq!(
            out,
            vec![
                Envelope::to_client(B, ClientMessage::Invalidate),
                Envelope::to_client(A, ClientMessage::Invalidate),
            ]
        );

        let (d, out) = send(&mut host, HostMessage::InvalidateAck);
        assert_eq!(d, Disposition::Handled);
        assert!(out.is_empty());
        assert_eq!(sharers(&host), vec![A]);

        let (_, out) = send(&mut host, HostMessage::InvalidateAck);
        assert_eq!(out, vec![Envelope::to_client(C, ClientMessage::GrantExclusive)]);
        assert_eq!(sharers(&host), vec![C]);
        assert!(host.exclusive_granted());
    }

    #[test]
    fn requests_and_stray_acks_are_deferred() {
        let mut host = Host::new(HOST);
        assert_eq!(
            send(&mut host, HostMessage::InvalidateAck).0,
            Disposition::Deferred
        );

        send(&mut host, HostMessage::ReqExcl { requester: A });
        send(&mut host, HostMessage::ReqExcl { requester: B });
        assert_eq!(host.state(), HostState::Invalidating);
        let (d, out) = send(&mut host, HostMessage::ReqShare { requester: C });
        assert_eq!(d, Disposition::Deferred);
        assert!(out.is_empty());
        assert_eq!(host.current_request().map(|r| r.requester), Some(B));
    }

    #[test]
    fn early_ack_is_consumed_once_the_cycle_starts() {
        let mut host = Host::new(HOST);
        send(&mut host, HostMessage::ReqShare { requester: A });

        let mut mailbox = Mailbox::new();
        mailbox.push(HostMessage::InvalidateAck);
        mailbox.push(HostMessage::ReqExcl { requester: B });

        let mut out = Vec::new();
        let mut log = Vec::new();
        while let Some(d) = mailbox.deliver(&mut host, &mut out).expect("legal message") {
            log.push((d.message, d.disposition, d.origin));
        }

        assert_eq!(
            log,
            vec![
                (HostMessage::InvalidateAck, Disposition::Deferred, Origin::Queue),
                (
                    HostMessage::ReqExcl { requester: B },
                    Disposition::Transitioned,
                    Origin::Queue
                ),
                (HostMessage::InvalidateAck, Disposition::Transitioned, Origin::Stash),
            ]
        );
        assert_eq!(
            out,
            vec![
                Envelope::to_client(A, ClientMessage::Invalidate),
                Envelope::to_client(B, ClientMessage::GrantExclusive),
            ]
        );
        assert!(mailbox.is_empty());
        assert_eq!(sharers(&host), vec![B]);
        assert_eq!(host.state(), HostState::Receiving);
    }

    #[test]
    fn upgrade_invalidates_the_requester_too() {
        let mut host = Host::new(HOST);
        send(&mut host, HostMessage::ReqShare { requester: A });
        let (_, out) = send(&mut host, HostMessage::ReqExcl { requester: A });
        assert_eq!(out, vec![Envelope::to_client(A, ClientMessage::Invalidate)]);

        let (_, out) = send(&mut host, HostMessage::InvalidateAck);
        assert_eq!(out, vec![Envelope::to_client(A, ClientMessage::GrantExclusive)]);
        assert_eq!(sharers(&host), vec![A]);
    }

    #[test]
    fn duplicate_share_is_a_violation() {
        let mut host = Host::new(HOST);
        let mut out = Vec::new();
        host.handle(HostMessage::ReqShare { requester: A }, &mut out)
            .unwrap();
        let err = host
            .handle(HostMessage::ReqShare { requester: A }, &mut out)
            .unwrap_err();
        assert_eq!(err, HostError::DuplicateSharer { client: A });
    }
}
