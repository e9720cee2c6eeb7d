//! Opaque identifiers shared with collaborators.
//!
//! ## Ownership
//!
//! - `MatchId`: issued by the persistence gateway, doubles as the store's session key
//! - `Stake`: the wager used to bucket players into matches (equality only)
//! - `TransportAddress`: a client connection handle owned by the transport layer
//!
//! The engine never interprets any of these beyond equality and hashing.

use serde::{Deserialize, Serialize};

/// Identifier of a single match.
///
/// ```
/// use ludo_sync::core::MatchId;
///
/// let id = MatchId::new("m-42");
/// assert_eq!(id.as_str(), "m-42");
/// assert_eq!(id.to_string(), "m-42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Wrap a gateway-issued id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wager amount in minor currency units.
///
/// Only compared for equality; balances are not tracked here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stake(pub u64);

impl Stake {
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Stake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a connected client, as handed out by the transport.
///
/// Treated as a destination only: the engine neither opens nor closes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportAddress(String);

impl TransportAddress {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
