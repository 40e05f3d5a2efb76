pub mod ids;
pub mod messages;

pub use ids::{ClientId, HostId, RequestKind};
pub use messages::{ClientMessage, Demand, Envelope, HostMessage, Request};
