//! Observable ledger events.
//!
//! Appended to the journal only after the producing call succeeds, in the
//! order the effects were applied.

use sbt_core::{Address, SlotId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// One observable state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A token was created.
    Minted {
        owner: Address,
        token: TokenId,
        value: u64,
    },
    /// A token was invalidated.
    Revoked { owner: Address, token: TokenId },
    /// Value was added.
    Charged { token: TokenId, value: u64 },
    /// Value was removed.
    Consumed { token: TokenId, value: u64 },
    /// A token record was removed.
    Destroyed { owner: Address, token: TokenId },
    /// Slot transition; `old_slot` is zero on first assignment.
    SlotChanged {
        token: TokenId,
        old_slot: SlotId,
        new_slot: SlotId,
    },
    /// Every token of `from` now belongs to `to`.
    Recovered {
        from: Address,
        to: Address,
        tokens: Vec<TokenId>,
    },
    /// An expiry date was set.
    ExpirySet { token: TokenId, date: Timestamp },
    /// A token was hidden from public queries.
    Shadowed { token: TokenId },
    /// A token was made visible again.
    Revealed { token: TokenId },
    /// A voter joined the governance set.
    VoterAdded { voter: Address },
    /// A voter left the governance set.
    VoterRemoved { voter: Address },
}

impl LedgerEvent {
    /// The token this event concerns, if it concerns exactly one.
    pub fn token(&self) -> Option<TokenId> {
        match self {
            Self::Minted { token, .. }
            | Self::Revoked { token, .. }
            | Self::Charged { token, .. }
            | Self::Consumed { token, .. }
            | Self::Destroyed { token, .. }
            | Self::SlotChanged { token, .. }
            | Self::ExpirySet { token, .. }
            | Self::Shadowed { token }
            | Self::Revealed { token } => Some(*token),
            Self::Recovered { .. } | Self::VoterAdded { .. } | Self::VoterRemoved { .. } => None,
        }
    }
}
