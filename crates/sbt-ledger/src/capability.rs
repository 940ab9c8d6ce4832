//! # Capability Discovery
//!
//! Callers ask "does this ledger support operation group X" instead of
//! probing for methods. The set is fixed when the ledger is constructed from
//! its [`LedgerConfig`](crate::config::LedgerConfig); operations of a disabled
//! group fail with [`LedgerError::Unsupported`](crate::LedgerError::Unsupported).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A group of related ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Mint, charge, consume, revoke, destroy, set-slot and the point queries.
    Core,
    /// Global and per-owner enumeration.
    Enumerable,
    /// Per-slot enumeration.
    SlotEnumerable,
    /// Voter-approved mint and revoke.
    Governance,
    /// One-time delegated mint and revoke grants.
    Delegation,
    /// Signature-based recovery of an address's tokens.
    Recovery,
    /// Per-token expiry dates.
    Expirable,
    /// Per-token visibility flag.
    Shadow,
    /// Contract, slot and token URI lookup.
    Metadata,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 9] = [
        Self::Core,
        Self::Enumerable,
        Self::SlotEnumerable,
        Self::Governance,
        Self::Delegation,
        Self::Recovery,
        Self::Expirable,
        Self::Shadow,
        Self::Metadata,
    ];

    /// Stable string tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Enumerable => "enumerable",
            Self::SlotEnumerable => "slot-enumerable",
            Self::Governance => "governance",
            Self::Delegation => "delegation",
            Self::Recovery => "recovery",
            Self::Expirable => "expirable",
            Self::Shadow => "shadow",
            Self::Metadata => "metadata",
        }
    }

    /// Resolve a tag produced by [`Self::as_str`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == tag)
    }

    /// The full set.
    pub fn all() -> BTreeSet<Capability> {
        Self::ALL.into_iter().collect()
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_tag(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::from_tag("transfer"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&Capability::SlotEnumerable).unwrap();
        assert_eq!(json, "\"slot-enumerable\"");
        let back: Capability = serde_json::from_str("\"recovery\"").unwrap();
        assert_eq!(back, Capability::Recovery);
    }

    #[test]
    fn test_all_is_complete() {
        assert_eq!(Capability::all().len(), Capability::ALL.len());
    }
}
