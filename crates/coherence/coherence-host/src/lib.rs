mod error;
mod host;
pub mod state;
pub mod transition;

pub use error::HostError;
pub use host::Host;
pub use state::HostState;
pub use transition::{Action, dispatch};
