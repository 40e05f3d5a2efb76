//! The seam between a mailbox and the state machine it feeds.
//!
//! Each actor kind exposes one handler that maps `(current state, message)` to
//! a [`Disposition`]. The mailbox only needs to know whether the message was
//! consumed, whether the state changed (which makes deferred messages eligible
//! again) or whether the message must stay in the mailbox.

/// What a state machine did with one offered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Consumed, and the machine moved to a different state.
    Transitioned,
    /// Consumed without a state change.
    Handled,
    /// Not consumed. The message stays in the mailbox and is offered again
    /// after the next state change.
    Deferred,
    /// Consumed and discarded with no effect.
    Ignored,
}

impl Disposition {
    #[inline]
    pub fn is_consumed(self) -> bool {
        !matches!(self, Disposition::Deferred)
    }
}

/// A run-to-completion actor.
///
/// `handle` must either fully process the message (pushing any outgoing
/// messages into `outbox`) or leave every observable field untouched and
/// return [`Disposition::Deferred`]/[`Disposition::Ignored`]. Messages that are
/// illegal in the current state are reported through `Err`; the caller treats
/// that as fatal.
pub trait StateMachine {
    type Message: Copy + std::fmt::Debug;
    type Output;
    type Error;

    fn handle(
        &mut self,
        message: Self::Message,
        outbox: &mut Vec<Self::Output>,
    ) -> Result<Disposition, Self::Error>;
}
