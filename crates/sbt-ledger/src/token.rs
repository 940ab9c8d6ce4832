//! The token record.

use sbt_core::{Address, SlotId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// A non-transferable credential record.
///
/// `issuer` never changes after mint. `owner` changes only through recovery.
/// Once `valid` is false it stays false; the record remains queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique id.
    pub id: TokenId,
    /// Current holder.
    pub owner: Address,
    /// Minting authority, or the request creator for approved and delegated mints.
    pub issuer: Address,
    /// Denomination.
    pub value: u64,
    /// Grouping category. Never zero on an extant token.
    pub slot: SlotId,
    /// False once revoked.
    pub valid: bool,
    /// Optional expiry date.
    #[serde(default)]
    pub expiry: Option<Timestamp>,
    /// Hidden from viewers other than owner and issuer.
    #[serde(default)]
    pub shadowed: bool,
}

impl Token {
    pub(crate) fn new(
        id: TokenId,
        owner: Address,
        issuer: Address,
        value: u64,
        slot: SlotId,
    ) -> Self {
        Self {
            id,
            owner,
            issuer,
            value,
            slot,
            valid: true,
            expiry: None,
            shadowed: false,
        }
    }

    /// True iff an expiry is set and lies strictly before `now`.
    ///
    /// Independent of `valid`: an expired token is not revoked.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|date| date < now)
    }

    /// Whether `viewer` may see a shadowed token.
    pub fn is_visible_to(&self, viewer: &Address) -> bool {
        !self.shadowed || self.owner == *viewer || self.issuer == *viewer
    }
}
