use crate::error::ClientError;
use crate::state::ClientState;
use crate::transition::{Step, Violation, step};
use coherence_events::{ClientId, ClientMessage, Envelope, HostId};
use coherence_mailbox::{Disposition, StateMachine};
use tracing::{debug, trace};

/// One node competing for the shared resource.
///
/// Owns nothing but its own access state and pending flag; everything it
/// learns about other clients comes through the host.
#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    host: Option<HostId>,
    state: ClientState,
    pending: bool,
}

impl Client {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            host: None,
            state: ClientState::Unconfigured,
            pending: false,
        }
    }

    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// True while a request is outstanding.
    #[inline]
    pub fn pending(&self) -> bool {
        self.pending
    }

    #[inline]
    pub fn host(&self) -> Option<HostId> {
        self.host
    }
}

impl StateMachine for Client {
    type Message = ClientMessage;
    type Output = Envelope;
    type Error = ClientError;

    fn handle(
        &mut self,
        message: ClientMessage,
        outbox: &mut Vec<Envelope>,
    ) -> Result<Disposition, ClientError> {
        match step(self.id, self.state, self.pending, message) {
            Step::Goto {
                next,
                pending,
                send,
                via,
            } => {
                if let ClientMessage::Configure { host, .. } = message {
                    self.host = Some(host);
                }
                if let Some(out) = send {
                    let host = self.host.ok_or(ClientError::NotConfigured { client: self.id })?;
                    outbox.push(Envelope::to_host(host, out));
                }
                debug!(
                    client = %self.id,
                    ?message,
                    from = ?self.state,
                    ?via,
                    to = ?next,
                    pending,
                    "client transition"
                );
                self.state = next;
                self.pending = pending;
                Ok(Disposition::Transitioned)
            }
            Step::Stay => {
                trace!(client = %self.id, ?message, state = ?self.state, "already satisfied");
                Ok(Disposition::Handled)
            }
            Step::Defer => Ok(Disposition::Deferred),
            Step::Ignore => {
                trace!(client = %self.id, ?message, state = ?self.state, "ignored");
                Ok(Disposition::Ignored)
            }
            Step::Illegal(Violation::UnexpectedMessage) => Err(ClientError::UnexpectedMessage {
                client: self.id,
                state: self.state,
                message,
            }),
            Step::Illegal(Violation::PendingWithoutRequest) => {
                Err(ClientError::PendingWithoutRequest {
                    client: self.id,
                    state: self.state,
                })
            }
        }
    }
}
