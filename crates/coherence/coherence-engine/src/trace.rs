use crate::scheduler::Participant;
use coherence_events::{ClientMessage, HostMessage};
use coherence_mailbox::Disposition;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Transitioned,
    Handled,
    Deferred,
    Ignored,
}

impl From<Disposition> for Outcome {
    fn from(d: Disposition) -> Self {
        match d {
            Disposition::Transitioned => Outcome::Transitioned,
            Disposition::Handled => Outcome::Handled,
            Disposition::Deferred => Outcome::Deferred,
            Disposition::Ignored => Outcome::Ignored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TracedMessage {
    Host(HostMessage),
    Client(ClientMessage),
}

/// One offered message, in global delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub step: u64,
    pub to: Participant,
    pub message: TracedMessage,
    pub outcome: Outcome,
}
