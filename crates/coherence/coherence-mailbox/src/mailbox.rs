//! Actor mailbox with an ordered deferral stash.
//!
//! A mailbox holds two queues:
//! - **queue**: messages in arrival order that have never been offered.
//! - **stash**: messages that were offered and deferred, still in arrival order.
//!
//! # Re-offer protocol
//!
//! Deferred messages sit "in front" of the queue. After every state change the
//! stash is re-scanned from its first entry; a stash entry that is deferred
//! again is skipped until the next state change. Only when every stash entry
//! has been offered in the current state does the mailbox move on to the
//! queue.
//!
//! ```text
//!            cursor
//!              v
//! stash: [ d0  d1 | d2  d3 ]      queue: [ q0  q1  q2 ]
//!         offered   eligible              never offered
//!         in this   for re-offer
//!         state
//! ```
//!
//! Any [`Disposition::Transitioned`] resets the cursor to 0, so `d0` and `d1`
//! get another chance in the new state before `d2`.

use crate::machine::{Disposition, StateMachine};
use std::collections::VecDeque;
use tracing::trace;

/// Where an offered message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Queue,
    Stash,
}

/// Record of one message offered to a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery<M> {
    pub message: M,
    pub disposition: Disposition,
    pub origin: Origin,
}

#[derive(Debug)]
pub struct Mailbox<M> {
    queue: VecDeque<M>,
    stash: VecDeque<M>,
    /// Index of the first stash entry not yet offered in the current state.
    cursor: usize,
}

impl<M> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Mailbox<M> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            stash: VecDeque::new(),
            cursor: 0,
        }
    }

    /// Appends a message. Messages from one sender keep their send order.
    #[inline]
    pub fn push(&mut self, message: M) {
        self.queue.push_back(message);
    }

    /// True when [`Mailbox::deliver`] would offer something.
    #[inline]
    pub fn has_work(&self) -> bool {
        self.cursor < self.stash.len() || !self.queue.is_empty()
    }

    /// Messages never offered yet.
    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Messages currently deferred.
    #[inline]
    pub fn stashed(&self) -> usize {
        self.stash.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.stash.is_empty()
    }
}

impl<M: Copy + std::fmt::Debug> Mailbox<M> {
    /// Offers exactly one message to `machine` and runs it to completion.
    ///
    /// Returns `Ok(None)` when nothing is deliverable: the queue is empty and
    /// every stashed message has already been deferred in the current state.
    ///
    /// # Errors
    /// Propagates the machine's error unchanged. The offending message has
    /// been removed from the mailbox at that point.
    pub fn deliver<S>(
        &mut self,
        machine: &mut S,
        outbox: &mut Vec<S::Output>,
    ) -> Result<Option<Delivery<M>>, S::Error>
    where
        S: StateMachine<Message = M>,
    {
        if self.cursor < self.stash.len() {
            let message = self.stash[self.cursor];
            let disposition = machine.handle(message, outbox).inspect_err(|_| {
                self.stash.remove(self.cursor);
            })?;
            match disposition {
                Disposition::Deferred => {
                    trace!(?message, "still deferred");
                    self.cursor += 1;
                }
                Disposition::Transitioned => {
                    self.stash.remove(self.cursor);
                    self.cursor = 0;
                }
                Disposition::Handled | Disposition::Ignored => {
                    self.stash.remove(self.cursor);
                }
            }
            return Ok(Some(Delivery {
                message,
                disposition,
                origin: Origin::Stash,
            }));
        }

        let Some(message) = self.queue.pop_front() else {
            return Ok(None);
        };
        let disposition = machine.handle(message, outbox)?;
        match disposition {
            Disposition::Deferred => {
                trace!(?message, "deferred");
                self.stash.push_back(message);
                self.cursor = self.stash.len();
            }
            Disposition::Transitioned => self.cursor = 0,
            Disposition::Handled | Disposition::Ignored => {}
        }
        Ok(Some(Delivery {
            message,
            disposition,
            origin: Origin::Queue,
        }))
    }
}
