use coherence_events::RequestKind;

/// A client's own view of its access right.
///
/// `Invalidating` only exists between receiving `Invalidate` and choosing the
/// follow-up state; a client is never observed resting in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Created but `Configure` not consumed yet.
    Unconfigured,
    Invalid,
    /// Sent `ReqShare` from Invalid.
    AwaitingShare,
    /// Sent `ReqExcl` from Invalid.
    AwaitingExclusive,
    /// Invalidated while a request of this kind was still outstanding.
    AwaitingGrant(RequestKind),
    Shared,
    /// Sent `ReqExcl` while holding shared access (upgrade).
    AwaitingGrantWhileSharing,
    Exclusive,
    Invalidating,
}

impl ClientState {
    /// Kind of the request this state is waiting on, if any.
    pub fn outstanding(self) -> Option<RequestKind> {
        match self {
            ClientState::AwaitingShare => Some(RequestKind::Share),
            ClientState::AwaitingExclusive | ClientState::AwaitingGrantWhileSharing => {
                Some(RequestKind::Exclusive)
            }
            ClientState::AwaitingGrant(kind) => Some(kind),
            _ => None,
        }
    }

    /// Waiting for a grant; local demands are deferred here.
    #[inline]
    pub fn is_awaiting(self) -> bool {
        self.outstanding().is_some()
    }

    /// Holds shared or exclusive access, i.e. should be in the host's sharer list.
    #[inline]
    pub fn holds_access(self) -> bool {
        matches!(self, ClientState::Shared | ClientState::Exclusive)
    }

    /// States in which `Invalidate` is a legal message.
    #[inline]
    pub fn accepts_invalidate(self) -> bool {
        self.is_awaiting() || self.holds_access()
    }
}
