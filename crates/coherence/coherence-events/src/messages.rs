// Message catalogue exchanged between actors. Everything is intra-process and
// Copy, so a mailbox can hold a message in its stash and re-offer it without cloning.

use crate::ids::{ClientId, HostId, RequestKind};
use serde::Serialize;

/// A protocol request as captured by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Request {
    pub kind: RequestKind,
    pub requester: ClientId,
}

/// Messages accepted by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    ReqShare { requester: ClientId },
    ReqExcl { requester: ClientId },
    /// Carries no identity; the host pairs acks with sharers by arrival order.
    InvalidateAck,
}

impl HostMessage {
    /// Wraps a request in the message variant matching its kind.
    pub fn request(request: Request) -> Self {
        match request.kind {
            RequestKind::Share => HostMessage::ReqShare {
                requester: request.requester,
            },
            RequestKind::Exclusive => HostMessage::ReqExcl {
                requester: request.requester,
            },
        }
    }

    /// The request carried by `ReqShare`/`ReqExcl`, `None` for acks.
    pub fn as_request(&self) -> Option<Request> {
        match *self {
            HostMessage::ReqShare { requester } => Some(Request {
                kind: RequestKind::Share,
                requester,
            }),
            HostMessage::ReqExcl { requester } => Some(Request {
                kind: RequestKind::Exclusive,
                requester,
            }),
            HostMessage::InvalidateAck => None,
        }
    }
}

/// Messages accepted by a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Configure { host: HostId, pending: bool },
    Invalidate,
    GrantExclusive,
    GrantShared,
    /// Local demand from the request source.
    AskShare,
    /// Local demand from the request source.
    AskExcl,
}

impl ClientMessage {
    pub fn ask(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Share => ClientMessage::AskShare,
            RequestKind::Exclusive => ClientMessage::AskExcl,
        }
    }
}

/// A local demand produced by a request source for one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Demand {
    pub client: ClientId,
    pub kind: RequestKind,
}

impl Demand {
    pub fn message(&self) -> ClientMessage {
        ClientMessage::ask(self.kind)
    }
}

/// An outgoing message together with its destination. Actors push these into
/// an outbox while handling a message; the runtime routes them afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "to", rename_all = "snake_case")]
pub enum Envelope {
    Host { host: HostId, message: HostMessage },
    Client { client: ClientId, message: ClientMessage },
}

impl Envelope {
    pub fn to_host(host: HostId, message: HostMessage) -> Self {
        Envelope::Host { host, message }
    }

    pub fn to_client(client: ClientId, message: ClientMessage) -> Self {
        Envelope::Client { client, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_maps_to_matching_variant() {
        let requester = ClientId(2);
        let excl = HostMessage::request(Request {
            kind: RequestKind::Exclusive,
            requester,
        });
        assert_eq!(excl, HostMessage::ReqExcl { requester });
        assert_eq!(
            excl.as_request(),
            Some(Request {
                kind: RequestKind::Exclusive,
                requester
            })
        );
        assert_eq!(HostMessage::InvalidateAck.as_request(), None);
    }

    #[test]
    fn demand_turns_into_ask() {
        let d = Demand {
            client: ClientId(0),
            kind: RequestKind::Share,
        };
        assert_eq!(d.message(), ClientMessage::AskShare);
        assert_eq!(ClientMessage::ask(RequestKind::Exclusive), ClientMessage::AskExcl);
    }
}
