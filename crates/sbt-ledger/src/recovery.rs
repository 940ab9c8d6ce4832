//! # Recovery Protocol
//!
//! The controller of `owner` signs a [`RecoveryMessage`] naming the
//! recipient and the owner's current nonce. The recipient submits the
//! signature through [`Ledger::recover`]; on success every token of `owner`
//! is rebound to the recipient in one step. Issuer, value, slot, validity,
//! expiry and visibility are untouched.
//!
//! Replay protection is twofold: the nonce advances on every successful
//! recovery, and the digest of every accepted signature is remembered and
//! refused thereafter.

use std::collections::{BTreeMap, BTreeSet};

use sbt_core::{hex, sha256_digest, Address, CanonicalBytes, ContentDigest, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capability::Capability;
use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::ledger::Ledger;

/// The message a recovery signature must cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMessage {
    /// Ledger domain separator.
    pub domain: String,
    /// Address whose tokens are recovered.
    pub owner: Address,
    /// Address receiving them.
    pub recipient: Address,
    /// Owner's recovery nonce at signing time.
    pub nonce: u64,
}

impl RecoveryMessage {
    /// JCS encoding of the message; the exact bytes that are signed.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, LedgerError> {
        Ok(CanonicalBytes::new(self)?)
    }
}

/// Per-owner nonces and spent signature digests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryState {
    nonces: BTreeMap<Address, u64>,
    spent: BTreeSet<ContentDigest>,
}

impl RecoveryState {
    /// Current nonce for `owner`.
    pub fn nonce_of(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    /// Number of signatures consumed so far.
    pub fn spent_count(&self) -> usize {
        self.spent.len()
    }

    fn digest(signature: &[u8]) -> Result<ContentDigest, LedgerError> {
        let canonical = CanonicalBytes::new(&hex::encode(signature))?;
        Ok(sha256_digest(&canonical))
    }
}

impl Ledger {
    /// The message `owner`'s controller must sign to move its tokens to
    /// `recipient`.
    pub fn recovery_challenge(
        &self,
        owner: Address,
        recipient: Address,
    ) -> Result<RecoveryMessage, LedgerError> {
        self.require(Capability::Recovery)?;
        Ok(RecoveryMessage {
            domain: self.config.domain.clone(),
            owner,
            recipient,
            nonce: self.recovery.nonce_of(&owner),
        })
    }

    /// Current recovery nonce of `owner`.
    pub fn recovery_nonce(&self, owner: &Address) -> u64 {
        self.recovery.nonce_of(owner)
    }

    /// Rebind every token of `owner` to `caller`, given a signature by
    /// `owner` over the current challenge. Returns the moved token ids.
    ///
    /// The signature is checked first, so a spent or forged signature
    /// fails with `InvalidSignature` whatever the state of `owner`.
    pub fn recover(
        &mut self,
        caller: Address,
        owner: Address,
        signature: &[u8],
    ) -> Result<Vec<TokenId>, LedgerError> {
        self.require(Capability::Recovery)?;
        let digest = RecoveryState::digest(signature)?;
        if self.recovery.spent.contains(&digest) {
            warn!(owner = %owner, caller = %caller, "recovery signature replayed");
            return Err(LedgerError::InvalidSignature(
                "signature has already been used".into(),
            ));
        }
        let message = self.recovery_challenge(owner, caller)?.canonical_bytes()?;
        if let Err(err) = self.verifier.verify(&owner, &message, signature) {
            warn!(owner = %owner, caller = %caller, reason = %err, "recovery signature rejected");
            return Err(LedgerError::InvalidSignature(err.to_string()));
        }
        if caller == owner {
            return Err(LedgerError::RecoveryToSelf(owner));
        }
        if self.store.tokens_of(&owner).is_empty() {
            return Err(LedgerError::NoTokens(owner));
        }

        let moved = self.store.rebind_owner(&owner, caller);
        self.recovery.spent.insert(digest);
        let nonce = self.recovery.nonces.entry(owner).or_insert(0);
        *nonce = nonce.saturating_add(1);

        info!(from = %owner, to = %caller, tokens = moved.len(), "tokens recovered");
        self.events.push(LedgerEvent::Recovered {
            from: owner,
            to: caller,
            tokens: moved.clone(),
        });
        Ok(moved)
    }
}
