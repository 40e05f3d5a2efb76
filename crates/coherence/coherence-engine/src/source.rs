use crate::error::EngineError;
use coherence_events::{ClientId, Demand, RequestKind};
use rand::Rng;

/// Endless stream of local demands: a uniformly chosen client and a fair coin
/// for share vs exclusive.
#[derive(Debug)]
pub struct RequestSource<R> {
    clients: Vec<ClientId>,
    rng: R,
}

impl<R: Rng> RequestSource<R> {
    pub fn new(clients: Vec<ClientId>, rng: R) -> Result<Self, EngineError> {
        if clients.is_empty() {
            return Err(EngineError::NoClients);
        }
        Ok(Self { clients, rng })
    }

    pub fn next_demand(&mut self) -> Demand {
        let client = self.clients[self.rng.random_range(0..self.clients.len())];
        let kind = if self.rng.random_bool(0.5) {
            RequestKind::Exclusive
        } else {
            RequestKind::Share
        };
        Demand { client, kind }
    }
}

impl<R: Rng> Iterator for RequestSource<R> {
    type Item = Demand;

    fn next(&mut self) -> Option<Demand> {
        Some(self.next_demand())
    }
}
