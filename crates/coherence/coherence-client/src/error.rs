use crate::state::ClientState;
use coherence_events::{ClientId, ClientMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("{client} received {message:?} in state {state:?}")]
    UnexpectedMessage {
        client: ClientId,
        state: ClientState,
        message: ClientMessage,
    },

    #[error("{client} is pending in state {state:?} with no outstanding request")]
    PendingWithoutRequest { client: ClientId, state: ClientState },

    #[error("{client} tried to send before it was configured")]
    NotConfigured { client: ClientId },
}
