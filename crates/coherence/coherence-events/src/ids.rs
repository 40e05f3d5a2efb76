#![forbid(unsafe_code)]

use serde::Serialize;
use std::fmt;

// ClientId is assigned once by the runtime and stays stable for the client's lifetime.
// repr(transparent) keeps it the same size as the u16 it wraps.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct ClientId(pub u16);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Address of the arbiter handed to clients in `Configure`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct HostId(pub u16);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

/// The access right a client asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Share,
    Exclusive,
}

impl RequestKind {
    #[inline]
    pub fn is_exclusive(self) -> bool {
        matches!(self, RequestKind::Exclusive)
    }
}
