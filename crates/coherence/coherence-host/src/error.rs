use crate::state::HostState;
use coherence_events::{ClientId, HostMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host received {message:?} in state {state:?}")]
    UnexpectedMessage {
        state: HostState,
        message: HostMessage,
    },

    #[error("{client} would be listed twice as a sharer")]
    DuplicateSharer { client: ClientId },

    #[error("exclusive access granted with {sharers} sharers listed")]
    ExclusiveNotSole { sharers: usize },

    #[error("host reached {state:?} without a captured request")]
    MissingRequest { state: HostState },
}
