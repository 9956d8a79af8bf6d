//! Identity - Opaque token identifying a client to the relay
//!
//! A fresh identity is generated once per session. Peer identities arrive
//! from the wire as arbitrary strings, so the token is kept as text.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque client token used to attribute messages and address a connection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Generate a fresh random identity (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identity received from the wire.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(token: &str) -> Self {
        Self::from_token(token)
    }
}

impl From<String> for Identity {
    fn from(token: String) -> Self {
        Self::from_token(token)
    }
}
