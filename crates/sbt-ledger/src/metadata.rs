//! Metadata URI resolution.
//!
//! The ledger treats URIs as opaque strings from a [`MetadataResolver`]. The
//! default [`TemplateResolver`] derives them from the configured base URI.

use sbt_core::{SlotId, TokenId};

use crate::capability::Capability;
use crate::config::MetadataConfig;
use crate::error::LedgerError;
use crate::ledger::Ledger;

/// Looks up contract, slot and token URIs.
pub trait MetadataResolver: Send + Sync + std::fmt::Debug {
    /// URI describing the whole ledger.
    fn contract_uri(&self) -> Option<String>;
    /// URI describing a slot.
    fn slot_uri(&self, slot: &SlotId) -> Option<String>;
    /// URI describing a token.
    fn token_uri(&self, token: &TokenId) -> Option<String>;
}

/// Resolves `{base}/slot/{id}` and `{base}/token/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateResolver {
    base_uri: String,
    contract_uri: Option<String>,
}

impl TemplateResolver {
    /// Build from configured metadata settings.
    pub fn from_config(config: &MetadataConfig) -> Self {
        Self {
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            contract_uri: config.contract_uri.clone(),
        }
    }

    fn under_base(&self, path: String) -> Option<String> {
        if self.base_uri.is_empty() {
            None
        } else {
            Some(format!("{}/{path}", self.base_uri))
        }
    }
}

impl MetadataResolver for TemplateResolver {
    fn contract_uri(&self) -> Option<String> {
        self.contract_uri
            .clone()
            .or_else(|| self.under_base("contract".to_string()))
    }

    fn slot_uri(&self, slot: &SlotId) -> Option<String> {
        self.under_base(format!("slot/{slot}"))
    }

    fn token_uri(&self, token: &TokenId) -> Option<String> {
        self.under_base(format!("token/{token}"))
    }
}

impl Ledger {
    /// The ledger-level metadata URI.
    pub fn contract_uri(&self) -> Result<Option<String>, LedgerError> {
        self.require(Capability::Metadata)?;
        Ok(self.resolver.contract_uri())
    }

    /// Metadata URI for a slot in use.
    pub fn slot_uri(&self, slot: &SlotId) -> Result<Option<String>, LedgerError> {
        self.require(Capability::Metadata)?;
        if self.store.tokens_in_slot(slot).is_empty() {
            return Err(LedgerError::SlotNotFound(*slot));
        }
        Ok(self.resolver.slot_uri(slot))
    }

    /// Metadata URI for a token, ignoring visibility. Use
    /// [`LedgerView::token_uri`](crate::LedgerView::token_uri) for viewer-facing lookups.
    pub fn token_uri(&self, token: &TokenId) -> Result<Option<String>, LedgerError> {
        self.require(Capability::Metadata)?;
        self.store.get(token)?;
        Ok(self.resolver.token_uri(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_paths() {
        let r = TemplateResolver::from_config(&MetadataConfig {
            base_uri: "https://meta.example/".into(),
            contract_uri: None,
        });
        assert_eq!(
            r.token_uri(&TokenId::from(12)).as_deref(),
            Some("https://meta.example/token/12")
        );
        assert_eq!(
            r.slot_uri(&SlotId::from(3)).as_deref(),
            Some("https://meta.example/slot/3")
        );
        assert_eq!(
            r.contract_uri().as_deref(),
            Some("https://meta.example/contract")
        );
    }

    #[test]
    fn test_explicit_contract_uri_wins() {
        let r = TemplateResolver::from_config(&MetadataConfig {
            base_uri: String::new(),
            contract_uri: Some("ipfs://contract".into()),
        });
        assert_eq!(r.contract_uri().as_deref(), Some("ipfs://contract"));
        assert_eq!(r.token_uri(&TokenId::from(1)), None);
    }
}
