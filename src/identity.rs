//! Caller identity as reported by the host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque byte encoding of the principal that invoked the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(Vec<u8>);

impl Principal {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for Principal {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Host subsystem that knows who is calling.
///
/// Queried on every call; implementations must not assume the answer is
/// cached. The host guarantees a caller is always available.
pub trait IdentityProvider: Send + Sync {
    fn caller(&self) -> Principal;
}

impl<F> IdentityProvider for F
where
    F: Fn() -> Principal + Send + Sync,
{
    fn caller(&self) -> Principal {
        self()
    }
}

/// Provider that always reports the same principal.
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub Principal);

impl IdentityProvider for FixedIdentity {
    fn caller(&self) -> Principal {
        self.0.clone()
    }
}
