use coherence_mailbox::{Mailbox, StateMachine};

/// A state machine paired with its private mailbox.
#[derive(Debug)]
pub struct Actor<S: StateMachine> {
    pub machine: S,
    pub mailbox: Mailbox<S::Message>,
}

impl<S: StateMachine> Actor<S> {
    pub fn new(machine: S) -> Self {
        Self {
            machine,
            mailbox: Mailbox::new(),
        }
    }
}
