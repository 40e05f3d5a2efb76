mod machine;
mod mailbox;

pub use machine::{Disposition, StateMachine};
pub use mailbox::{Delivery, Mailbox, Origin};
