//! Identity types for nearby-sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when constructing an [`Identity`] from an empty token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity token must not be empty")]
pub struct EmptyIdentity;

/// An opaque token uniquely naming a participant for location sharing.
///
/// Stable for the lifetime of a session and never empty. The token format
/// is owned by whoever mints identities (the surrounding application or
/// [`Identity::random`]); this crate treats it as opaque.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an Identity from a token. Fails on empty or whitespace-only input.
    pub fn new(token: impl Into<String>) -> Result<Self, EmptyIdentity> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(EmptyIdentity);
        }
        Ok(Self(token))
    }

    /// Mint a new random Identity (UUID v4 token).
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = EmptyIdentity;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::new(token)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.0.chars().take(8).collect::<String>();
        write!(f, "Identity({prefix})")
    }
}
