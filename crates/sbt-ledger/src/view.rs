//! Viewer-scoped queries that honor the shadow flag.
//!
//! A shadowed token is visible only to its owner and issuer. Every lookup
//! through a [`LedgerView`] fails with `TokenShadowed` for anyone else.

use sbt_core::{Address, SlotId, TokenId};

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::token::Token;

/// Read access to a ledger on behalf of one viewer.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    ledger: &'a Ledger,
    viewer: Address,
}

impl<'a> LedgerView<'a> {
    pub(crate) fn new(ledger: &'a Ledger, viewer: Address) -> Self {
        Self { ledger, viewer }
    }

    /// The viewer this view answers for.
    pub fn viewer(&self) -> Address {
        self.viewer
    }

    /// The token record, if visible.
    pub fn token(&self, id: &TokenId) -> Result<&'a Token, LedgerError> {
        let token = self.ledger.token(id)?;
        if token.is_visible_to(&self.viewer) {
            Ok(token)
        } else {
            Err(LedgerError::TokenShadowed(*id))
        }
    }

    /// Owner of a visible token.
    pub fn owner_of(&self, id: &TokenId) -> Result<Address, LedgerError> {
        self.token(id).map(|t| t.owner)
    }

    /// Value of a visible token.
    pub fn value_of(&self, id: &TokenId) -> Result<u64, LedgerError> {
        self.token(id).map(|t| t.value)
    }

    /// Slot of a visible token.
    pub fn slot_of(&self, id: &TokenId) -> Result<SlotId, LedgerError> {
        self.token(id).map(|t| t.slot)
    }

    /// Metadata URI of a visible token.
    pub fn token_uri(&self, id: &TokenId) -> Result<Option<String>, LedgerError> {
        self.token(id)?;
        self.ledger.token_uri(id)
    }

    /// Tokens of `owner` this viewer may see.
    pub fn tokens_of(&self, owner: &Address) -> Vec<TokenId> {
        self.ledger
            .store
            .tokens_of(owner)
            .iter()
            .filter(|id| {
                self.ledger
                    .store
                    .get(id)
                    .is_ok_and(|t| t.is_visible_to(&self.viewer))
            })
            .copied()
            .collect()
    }
}

impl Ledger {
    /// Queries on behalf of `viewer`.
    pub fn view_as(&self, viewer: Address) -> LedgerView<'_> {
        LedgerView::new(self, viewer)
    }

    /// Owner of `token` as seen by `viewer`.
    pub fn owner_of_for(&self, viewer: Address, token: &TokenId) -> Result<Address, LedgerError> {
        self.view_as(viewer).owner_of(token)
    }

    /// Metadata URI of `token` as seen by `viewer`.
    pub fn token_uri_for(
        &self,
        viewer: Address,
        token: &TokenId,
    ) -> Result<Option<String>, LedgerError> {
        self.view_as(viewer).token_uri(token)
    }
}
