//! Account identity
//!
//! Depositors, delegates and the pool administrator are all identified by an
//! opaque account string (an address, a DID, a user id). The ledger never
//! interprets it beyond equality and hashing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_string() {
        let id = AccountId::new("0xabc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xabc\"");
        let back: AccountId = serde_json::from_str("\"0xabc\"").unwrap();
        assert_eq!(back, id);
    }
}
