mod client;
mod error;
pub mod state;
pub mod transition;

pub use client::Client;
pub use error::ClientError;
pub use state::ClientState;
pub use transition::{Step, Violation, step};
