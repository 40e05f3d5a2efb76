// Client transition table.
//
// Pure function of (state, pending flag, message). It never touches a Client
// value, so it can be enumerated by tests or by an external checker without a
// runtime. `Client::handle` applies the returned Step.
//
//  state                      | AskShare   | AskExcl    | Invalidate | GrantShared | GrantExclusive
//  ---------------------------+------------+------------+------------+-------------+---------------
//  Unconfigured               | defer      | defer      | illegal    | illegal     | illegal
//  Invalid                    | ReqShare   | ReqExcl    | illegal    | illegal     | illegal
//  AwaitingShare              | defer      | defer      | ack        | -> Shared   | illegal
//  AwaitingExclusive          | defer      | defer      | ack        | illegal     | -> Exclusive
//  AwaitingGrant(Share)       | defer      | defer      | ack        | -> Shared   | illegal
//  AwaitingGrant(Exclusive)   | defer      | defer      | ack        | illegal     | -> Exclusive
//  Shared                     | stay       | ReqExcl    | ack        | illegal     | illegal
//  AwaitingGrantWhileSharing  | defer      | defer      | ack        | illegal     | -> Exclusive
//  Exclusive                  | ignore     | ignore     | ack        | illegal     | illegal
//
// `Configure` is legal only in Unconfigured. "ack" passes through Invalidating,
// sends InvalidateAck and lands in AwaitingGrant(kind) when pending, else Invalid.

use crate::state::ClientState;
use coherence_events::{ClientId, ClientMessage, HostMessage, Request, RequestKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Consume the message and move to `next`.
    Goto {
        next: ClientState,
        pending: bool,
        send: Option<HostMessage>,
        /// Transient state passed through on the way to `next`.
        via: Option<ClientState>,
    },
    /// Consume with no state change and no effect on the host.
    Stay,
    Defer,
    Ignore,
    Illegal(Violation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    UnexpectedMessage,
    PendingWithoutRequest,
}

pub fn step(id: ClientId, state: ClientState, pending: bool, message: ClientMessage) -> Step {
    use ClientMessage as M;
    use ClientState as S;

    match (state, message) {
        (S::Unconfigured, M::Configure { pending, .. }) => Step::Goto {
            next: S::Invalid,
            pending,
            send: None,
            via: None,
        },
        (_, M::Configure { .. }) => Step::Illegal(Violation::UnexpectedMessage),

        (S::Invalid, M::AskShare) => request(id, RequestKind::Share, S::AwaitingShare),
        (S::Invalid, M::AskExcl) => request(id, RequestKind::Exclusive, S::AwaitingExclusive),
        (S::Shared, M::AskShare) => Step::Stay,
        (S::Shared, M::AskExcl) => {
            request(id, RequestKind::Exclusive, S::AwaitingGrantWhileSharing)
        }
        (S::Exclusive, M::AskShare | M::AskExcl) => Step::Ignore,
        (s, M::AskShare | M::AskExcl) if s.is_awaiting() || s == S::Unconfigured => Step::Defer,

        (s, M::Invalidate) if s.accepts_invalidate() => invalidate(s, pending),

        (S::AwaitingShare | S::AwaitingGrant(RequestKind::Share), M::GrantShared) => Step::Goto {
            next: S::Shared,
            pending: false,
            send: None,
            via: None,
        },
        (
            S::AwaitingExclusive
            | S::AwaitingGrantWhileSharing
            | S::AwaitingGrant(RequestKind::Exclusive),
            M::GrantExclusive,
        ) => Step::Goto {
            next: S::Exclusive,
            pending: false,
            send: None,
            via: None,
        },

        _ => Step::Illegal(Violation::UnexpectedMessage),
    }
}

fn request(id: ClientId, kind: RequestKind, next: ClientState) -> Step {
    Step::Goto {
        next,
        pending: true,
        send: Some(HostMessage::request(Request {
            kind,
            requester: id,
        })),
        via: None,
    }
}

fn invalidate(state: ClientState, pending: bool) -> Step {
    let next = match (pending, state.outstanding()) {
        (true, Some(kind)) => ClientState::AwaitingGrant(kind),
        (true, None) => return Step::Illegal(Violation::PendingWithoutRequest),
        (false, _) => ClientState::Invalid,
    };
    Step::Goto {
        next,
        pending,
        send: Some(HostMessage::InvalidateAck),
        via: Some(ClientState::Invalidating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coherence_events::HostId;

    const ME: ClientId = ClientId(4);

    fn goto(step: Step) -> (ClientState, bool, Option<HostMessage>) {
        match step {
            Step::Goto {
                next, pending, send, ..
            } => (next, pending, send),
            other => panic!("expected a transition, got {other:?}"),
        }
    }

    #[test]
    fn configure_leaves_unconfigured_once() {
        let cfg = ClientMessage::Configure {
            host: HostId(0),
            pending: false,
        };
        assert_eq!(
            goto(step(ME, ClientState::Unconfigured, false, cfg)),
            (ClientState::Invalid, false, None)
        );
        assert_eq!(
            step(ME, ClientState::Invalid, false, cfg),
            Step::Illegal(Violation::UnexpectedMessage)
        );
    }

    #[test]
    fn invalid_client_requests_on_demand() {
        assert_eq!(
            goto(step(ME, ClientState::Invalid, false, ClientMessage::AskShare)),
            (
                ClientState::AwaitingShare,
                true,
                Some(HostMessage::ReqShare { requester: ME })
            )
        );
        assert_eq!(
            goto(step(ME, ClientState::Invalid, false, ClientMessage::AskExcl)),
            (
                ClientState::AwaitingExclusive,
                true,
                Some(HostMessage::ReqExcl { requester: ME })
            )
        );
    }

    #[test]
    fn demands_are_deferred_while_awaiting() {
        let waiting = [
            ClientState::Unconfigured,
            ClientState::AwaitingShare,
            ClientState::AwaitingExclusive,
            ClientState::AwaitingGrant(RequestKind::Share),
            ClientState::AwaitingGrant(RequestKind::Exclusive),
            ClientState::AwaitingGrantWhileSharing,
        ];
        for state in waiting {
            for ask in [ClientMessage::AskShare, ClientMessage::AskExcl] {
                assert_eq!(step(ME, state, true, ask), Step::Defer, "{state:?} {ask:?}");
            }
        }
    }

    #[test]
    fn exclusive_ignores_demands_and_shared_upgrades() {
        for ask in [ClientMessage::AskShare, ClientMessage::AskExcl] {
            assert_eq!(step(ME, ClientState::Exclusive, false, ask), Step::Ignore);
        }
        assert_eq!(
            step(ME, ClientState::Shared, false, ClientMessage::AskShare),
            Step::Stay
        );
        assert_eq!(
            goto(step(ME, ClientState::Shared, false, ClientMessage::AskExcl)),
            (
                ClientState::AwaitingGrantWhileSharing,
                true,
                Some(HostMessage::ReqExcl { requester: ME })
            )
        );
    }

    #[test]
    fn invalidate_acks_and_returns_to_invalid_when_idle() {
        for state in [ClientState::Shared, ClientState::Exclusive] {
            let s = step(ME, state, false, ClientMessage::Invalidate);
            assert_eq!(
                s,
                Step::Goto {
                    next: ClientState::Invalid,
                    pending: false,
                    send: Some(HostMessage::InvalidateAck),
                    via: Some(ClientState::Invalidating),
                }
            );
        }
    }

    #[test]
    fn invalidate_while_pending_keeps_waiting_on_same_kind() {
        assert_eq!(
            goto(step(
                ME,
                ClientState::AwaitingGrantWhileSharing,
                true,
                ClientMessage::Invalidate
            )),
            (
                ClientState::AwaitingGrant(RequestKind::Exclusive),
                true,
                Some(HostMessage::InvalidateAck)
            )
        );
        assert_eq!(
            goto(step(ME, ClientState::AwaitingShare, true, ClientMessage::Invalidate)).0,
            ClientState::AwaitingGrant(RequestKind::Share)
        );
    }

    #[test]
    fn pending_holder_is_inconsistent() {
        assert_eq!(
            step(ME, ClientState::Shared, true, ClientMessage::Invalidate),
            Step::Illegal(Violation::PendingWithoutRequest)
        );
    }

    #[test]
    fn grants_must_match_outstanding_kind() {
        assert_eq!(
            goto(step(
                ME,
                ClientState::AwaitingGrant(RequestKind::Exclusive),
                true,
                ClientMessage::GrantExclusive
            )),
            (ClientState::Exclusive, false, None)
        );
        assert_eq!(
            goto(step(ME, ClientState::AwaitingShare, true, ClientMessage::GrantShared)),
            (ClientState::Shared, false, None)
        );
        assert_eq!(
            step(ME, ClientState::AwaitingShare, true, ClientMessage::GrantExclusive),
            Step::Illegal(Violation::UnexpectedMessage)
        );
        assert_eq!(
            step(
                ME,
                ClientState::AwaitingGrantWhileSharing,
                true,
                ClientMessage::GrantShared
            ),
            Step::Illegal(Violation::UnexpectedMessage)
        );
    }

    #[test]
    fn unsolicited_grants_and_invalidations_are_illegal() {
        for msg in [
            ClientMessage::Invalidate,
            ClientMessage::GrantShared,
            ClientMessage::GrantExclusive,
        ] {
            assert_eq!(
                step(ME, ClientState::Invalid, false, msg),
                Step::Illegal(Violation::UnexpectedMessage)
            );
        }
        assert_eq!(
            step(ME, ClientState::Shared, false, ClientMessage::GrantShared),
            Step::Illegal(Violation::UnexpectedMessage)
        );
    }
}
