/// Logical states of the arbiter.
///
/// Only `Receiving` and `Invalidating` are resting states. The others are
/// passed through inside a single run-to-completion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostState {
    #[default]
    Receiving,
    CapturingRequest,
    Deciding,
    Invalidating,
    Granting,
}

impl HostState {
    #[inline]
    pub fn is_resting(self) -> bool {
        matches!(self, HostState::Receiving | HostState::Invalidating)
    }
}
