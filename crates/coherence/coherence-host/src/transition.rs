// Host transition table for resting states.
//
//  state         | ReqShare / ReqExcl | InvalidateAck
//  --------------+--------------------+--------------
//  Receiving     | capture            | defer
//  Invalidating  | defer              | ack
//  (transient)   | illegal            | illegal
//
// What happens after a capture or an ack depends on the sharer list and is
// resolved by Host::settle.

use crate::state::HostState;
use coherence_events::{HostMessage, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Capture(Request),
    Ack,
    Defer,
    Illegal,
}

pub fn dispatch(state: HostState, message: HostMessage) -> Action {
    match (state, message.as_request()) {
        (HostState::Receiving, Some(request)) => Action::Capture(request),
        (HostState::Receiving, None) => Action::Defer,
        (HostState::Invalidating, Some(_)) => Action::Defer,
        (HostState::Invalidating, None) => Action::Ack,
        _ => Action::Illegal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coherence_events::{ClientId, RequestKind};

    #[test]
    fn receiving_captures_requests_and_defers_stray_acks() {
        let requester = ClientId(1);
        assert_eq!(
            dispatch(HostState::Receiving, HostMessage::ReqShare { requester }),
            Action::Capture(Request {
                kind: RequestKind::Share,
                requester
            })
        );
        assert_eq!(
            dispatch(HostState::Receiving, HostMessage::InvalidateAck),
            Action::Defer
        );
    }

    #[test]
    fn invalidating_serializes_requests() {
        assert_eq!(
            dispatch(
                HostState::Invalidating,
                HostMessage::ReqExcl {
                    requester: ClientId(0)
                }
            ),
            Action::Defer
        );
        assert_eq!(
            dispatch(HostState::Invalidating, HostMessage::InvalidateAck),
            Action::Ack
        );
    }

    #[test]
    fn transient_states_accept_nothing() {
        for state in [
            HostState::CapturingRequest,
            HostState::Deciding,
            HostState::Granting,
        ] {
            assert_eq!(dispatch(state, HostMessage::InvalidateAck), Action::Illegal);
        }
    }
}
