//! # Ledger Configuration
//!
//! Roles, enabled capabilities and metadata settings for one ledger
//! instance. The configuration is owned by the [`Ledger`](crate::Ledger) it
//! constructs; there is no process-wide admin or voter state.
//!
//! Loadable from YAML or JSON:
//!
//! ```yaml
//! domain: credentials.example
//! administrator: "0x00000000000000000000000000000000000000aa"
//! minters: ["0x00000000000000000000000000000000000000aa"]
//! voters: []
//! capabilities: [core, enumerable, slot-enumerable, governance]
//! metadata:
//!   base_uri: https://credentials.example/meta
//! ```

use std::collections::BTreeSet;

use sbt_core::Address;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::LedgerError;

/// Base URIs handed to the default metadata resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Prefix for slot and token URIs. Empty disables URI resolution.
    #[serde(default)]
    pub base_uri: String,
    /// Contract-level URI; defaults to `base_uri` + "/contract".
    #[serde(default)]
    pub contract_uri: Option<String>,
}

/// Construction-time settings for a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Domain separator bound into every recovery message.
    pub domain: String,
    /// Manages the voter set and may grant delegations.
    pub administrator: Address,
    /// Additional direct-mint authorities. The administrator always mints.
    #[serde(default)]
    pub minters: Vec<Address>,
    /// Initial governance voters.
    #[serde(default)]
    pub voters: Vec<Address>,
    /// Enabled operation groups.
    #[serde(default = "Capability::all")]
    pub capabilities: BTreeSet<Capability>,
    /// Metadata resolution settings.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl LedgerConfig {
    /// A config with every capability enabled and no minters besides
    /// `administrator`.
    pub fn new(domain: impl Into<String>, administrator: Address) -> Self {
        Self {
            domain: domain.into(),
            administrator,
            minters: Vec::new(),
            voters: Vec::new(),
            capabilities: Capability::all(),
            metadata: MetadataConfig::default(),
        }
    }

    /// Add a minting authority.
    pub fn with_minter(mut self, minter: Address) -> Self {
        if minter != self.administrator && !self.minters.contains(&minter) {
            self.minters.push(minter);
        }
        self
    }

    /// Add an initial voter.
    pub fn with_voter(mut self, voter: Address) -> Self {
        self.voters.push(voter);
        self
    }

    /// Replace the capability set.
    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    /// Set the metadata base URI.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.metadata.base_uri = base_uri.into();
        self
    }

    /// Whether `addr` may mint directly.
    pub fn is_minter(&self, addr: &Address) -> bool {
        *addr == self.administrator || self.minters.contains(addr)
    }

    /// Every direct-mint authority, administrator included.
    pub fn minter_set(&self) -> BTreeSet<Address> {
        std::iter::once(self.administrator)
            .chain(self.minters.iter().copied())
            .collect()
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.domain.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("domain must not be empty".into()));
        }
        if self.administrator.is_zero() {
            return Err(LedgerError::InvalidConfig(
                "administrator must not be the zero address".into(),
            ));
        }
        if !self.capabilities.contains(&Capability::Core) {
            return Err(LedgerError::InvalidConfig(
                "the core capability cannot be disabled".into(),
            ));
        }
        let mut seen = BTreeSet::new();
        for voter in &self.voters {
            if voter.is_zero() {
                return Err(LedgerError::InvalidConfig(
                    "voter must not be the zero address".into(),
                ));
            }
            if !seen.insert(*voter) {
                return Err(LedgerError::DuplicateVoter(*voter));
            }
        }
        if self.minters.iter().any(Address::is_zero) {
            return Err(LedgerError::InvalidConfig(
                "minter must not be the zero address".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_bytes([0xaa; 20])
    }

    #[test]
    fn test_new_config_is_valid() {
        let cfg = LedgerConfig::new("test", admin());
        cfg.validate().unwrap();
        assert!(cfg.is_minter(&admin()));
        assert_eq!(cfg.capabilities, Capability::all());
    }

    #[test]
    fn test_empty_domain_rejected() {
        let cfg = LedgerConfig::new("  ", admin());
        assert!(matches!(cfg.validate(), Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_admin_rejected() {
        let cfg = LedgerConfig::new("test", Address::ZERO);
        assert!(matches!(cfg.validate(), Err(LedgerError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_voter_rejected() {
        let v = Address::from_bytes([1; 20]);
        let cfg = LedgerConfig::new("test", admin()).with_voter(v).with_voter(v);
        assert!(matches!(cfg.validate(), Err(LedgerError::DuplicateVoter(a)) if a == v));
    }

    #[test]
    fn test_core_capability_required() {
        let cfg = LedgerConfig::new("test", admin()).with_capabilities([Capability::Governance]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_with_minter_deduplicates() {
        let other = Address::from_bytes([2; 20]);
        let cfg = LedgerConfig::new("test", admin())
            .with_minter(admin())
            .with_minter(other)
            .with_minter(other);
        assert_eq!(cfg.minters, vec![other]);
        assert_eq!(cfg.minter_set().len(), 2);
    }

    // ── Minters ──────────────────────────────────────────────────────

    #[test]
    fn test_loaded_and_built_configs_agree_on_minters() {
        let json = r#"{
            "domain": "test",
            "administrator": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        }"#;
        let loaded: LedgerConfig = serde_json::from_str(json).unwrap();
        let built = LedgerConfig::new("test", admin());
        assert_eq!(loaded.minter_set(), built.minter_set());
        assert!(loaded.is_minter(&admin()));
        assert_eq!(loaded, built);
    }

    #[test]
    fn test_listed_admin_is_not_double_counted() {
        let json = r#"{
            "domain": "test",
            "administrator": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "minters": ["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"]
        }"#;
        let cfg: LedgerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.minter_set(), LedgerConfig::new("test", admin()).minter_set());
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "domain": "test",
            "administrator": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        }"#;
        let cfg: LedgerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.administrator, admin());
        assert!(cfg.minters.is_empty());
        assert_eq!(cfg.capabilities, Capability::all());
        assert_eq!(cfg.metadata, MetadataConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{
            "domain": "test",
            "administrator": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "quorum": 3
        }"#;
        assert!(serde_json::from_str::<LedgerConfig>(json).is_err());
    }
}
