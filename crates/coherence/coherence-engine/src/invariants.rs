//! Safety checks over a snapshot of the whole system.
//!
//! [`check`] holds under every interleaving and runs after each delivery.
//! [`check_quiescent`] additionally requires that nothing is in flight, so it
//! only runs once every mailbox is empty.

use coherence_client::{Client, ClientState};
use coherence_events::ClientId;
use coherence_host::{Host, HostState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("exclusive granted with {sharers} sharers listed")]
    ExclusiveNotSole { sharers: usize },

    #[error("{client} appears twice in the sharer list")]
    DuplicateSharer { client: ClientId },

    #[error("{first} and {second} are both exclusive")]
    MultipleExclusive { first: ClientId, second: ClientId },

    #[error("{client} is exclusive but the host does not list it as sole exclusive holder")]
    ExclusiveUnlisted { client: ClientId },

    #[error("{client} is shared but the host does not list it as a shared holder")]
    SharedUnlisted { client: ClientId },

    #[error("{client} is shared while the host has granted exclusive access")]
    SharedUnderExclusive { client: ClientId },

    #[error("{listed} sharers listed but {holding} clients hold access")]
    SharerCountMismatch { listed: usize, holding: usize },

    #[error("{client} is listed but holds no access")]
    ListedWithoutAccess { client: ClientId },

    #[error("{client} is still waiting in {state:?} with nothing in flight")]
    StillWaiting { client: ClientId, state: ClientState },
}

pub fn check<'a>(
    host: &Host,
    clients: impl IntoIterator<Item = &'a Client>,
) -> Result<(), InvariantViolation> {
    let sharers: Vec<ClientId> = host.sharers().collect();

    if host.exclusive_granted() && sharers.len() != 1 {
        return Err(InvariantViolation::ExclusiveNotSole {
            sharers: sharers.len(),
        });
    }
    for (i, client) in sharers.iter().enumerate() {
        if sharers[..i].contains(client) {
            return Err(InvariantViolation::DuplicateSharer { client: *client });
        }
    }

    let mut exclusive: Option<ClientId> = None;
    for client in clients {
        let id = client.id();
        match client.state() {
            ClientState::Exclusive => {
                if let Some(first) = exclusive {
                    return Err(InvariantViolation::MultipleExclusive { first, second: id });
                }
                exclusive = Some(id);
                if !host.exclusive_granted() || sharers != [id] {
                    return Err(InvariantViolation::ExclusiveUnlisted { client: id });
                }
            }
            ClientState::Shared => {
                if host.exclusive_granted() {
                    return Err(InvariantViolation::SharedUnderExclusive { client: id });
                }
                // Acks pop the list head regardless of sender, so while a
                // cycle is running a still-shared client may be off the list.
                if host.state() != HostState::Invalidating && !sharers.contains(&id) {
                    return Err(InvariantViolation::SharedUnlisted { client: id });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

pub fn check_quiescent<'a>(
    host: &Host,
    clients: impl IntoIterator<Item = &'a Client> + Clone,
) -> Result<(), InvariantViolation> {
    check(host, clients.clone())?;

    let mut holding = 0usize;
    for client in clients {
        let state = client.state();
        if client.pending() || state.is_awaiting() {
            return Err(InvariantViolation::StillWaiting {
                client: client.id(),
                state,
            });
        }
        if state.holds_access() {
            holding += 1;
        } else if host.is_sharer(client.id()) {
            return Err(InvariantViolation::ListedWithoutAccess { client: client.id() });
        }
    }

    let listed = host.sharers().len();
    if listed != holding {
        return Err(InvariantViolation::SharerCountMismatch { listed, holding });
    }
    Ok(())
}
