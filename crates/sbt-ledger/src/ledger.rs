//! # Ledger
//!
//! The state machine tying the store to its workflows. Every public method
//! is one atomic transaction: it checks capability, authorization and every
//! precondition first, then applies its effects, then journals events. A
//! returned error means nothing changed.
//!
//! Governance, delegation, recovery, expiry, metadata and viewer-scoped
//! operations live in their own modules as further `impl Ledger` blocks.

use std::collections::BTreeSet;
use std::sync::Arc;

use sbt_core::{Address, Clock, SlotId, SystemClock, Timestamp, TokenId};
use sbt_crypto::{Ed25519RecoveryVerifier, SignatureVerifier};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capability::Capability;
use crate::config::LedgerConfig;
use crate::delegation::DelegationState;
use crate::error::{at, LedgerError};
use crate::event::LedgerEvent;
use crate::gate::{Action, AuthProof, Ticket};
use crate::governance::GovernanceState;
use crate::metadata::{MetadataResolver, TemplateResolver};
use crate::recovery::RecoveryState;
use crate::store::LedgerStore;
use crate::token::Token;

/// A non-transferable token ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) store: LedgerStore,
    pub(crate) governance: GovernanceState,
    pub(crate) delegation: DelegationState,
    pub(crate) recovery: RecoveryState,
    pub(crate) events: Vec<LedgerEvent>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) verifier: Arc<dyn SignatureVerifier>,
    pub(crate) resolver: Arc<dyn MetadataResolver>,
}

/// Complete serializable ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Construction settings.
    pub config: LedgerConfig,
    /// Tokens and indices.
    pub store: LedgerStore,
    /// Voters and approval requests.
    pub governance: GovernanceState,
    /// Delegate requests and grants.
    pub delegation: DelegationState,
    /// Nonces and spent signatures.
    pub recovery: RecoveryState,
    /// Event journal.
    pub events: Vec<LedgerEvent>,
}

impl Ledger {
    // ── Construction ─────────────────────────────────────────────────

    /// Build an empty ledger. Uses the system clock, Ed25519 recovery
    /// proofs and URIs templated from the configured base URI.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let governance = GovernanceState::new(config.voters.iter().copied());
        let resolver = TemplateResolver::from_config(&config.metadata);
        info!(
            domain = %config.domain,
            administrator = %config.administrator,
            minters = config.minter_set().len(),
            voters = config.voters.len(),
            "ledger created"
        );
        Ok(Self {
            config,
            store: LedgerStore::new(),
            governance,
            delegation: DelegationState::default(),
            recovery: RecoveryState::default(),
            events: Vec::new(),
            clock: Arc::new(SystemClock),
            verifier: Arc::new(Ed25519RecoveryVerifier),
            resolver: Arc::new(resolver),
        })
    }

    /// Restore a ledger from a snapshot. The indices are audited first.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        snapshot.config.validate()?;
        snapshot.store.check_consistency()?;
        let mut ledger = Self::new(snapshot.config)?;
        ledger.store = snapshot.store;
        ledger.governance = snapshot.governance;
        ledger.delegation = snapshot.delegation;
        ledger.recovery = snapshot.recovery;
        ledger.events = snapshot.events;
        Ok(ledger)
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the recovery signature verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Replace the metadata resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn MetadataResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            config: self.config.clone(),
            store: self.store.clone(),
            governance: self.governance.clone(),
            delegation: self.delegation.clone(),
            recovery: self.recovery.clone(),
            events: self.events.clone(),
        }
    }

    /// The configuration this ledger was built from.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current time according to the ledger's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Audit every index against the token table.
    pub fn check_consistency(&self) -> Result<(), LedgerError> {
        self.store.check_consistency()
    }

    // ── Capabilities ─────────────────────────────────────────────────

    /// Enabled operation groups.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.config.capabilities
    }

    /// Whether an operation group is enabled.
    pub fn supports(&self, capability: Capability) -> bool {
        self.config.capabilities.contains(&capability)
    }

    /// Whether the group named by `tag` is enabled. Unknown tags are not.
    pub fn supports_tag(&self, tag: &str) -> bool {
        Capability::from_tag(tag).is_some_and(|c| self.supports(c))
    }

    pub(crate) fn require(&self, capability: Capability) -> Result<(), LedgerError> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(LedgerError::Unsupported(capability))
        }
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Journal of events since construction or the last drain.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain the journal.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Mint ─────────────────────────────────────────────────────────

    /// Mint a token to `owner` under the next sequential id. Minters only;
    /// the caller becomes the issuer.
    pub fn mint(
        &mut self,
        caller: Address,
        owner: Address,
        value: u64,
        slot: SlotId,
    ) -> Result<TokenId, LedgerError> {
        let ticket = self.authorize(&caller, &Action::Mint, &AuthProof::Direct)?;
        self.mint_ticketed(&ticket, None, owner, caller, value, slot)
    }

    /// Mint under a caller-chosen id.
    pub fn mint_with_id(
        &mut self,
        caller: Address,
        id: TokenId,
        owner: Address,
        value: u64,
        slot: SlotId,
    ) -> Result<TokenId, LedgerError> {
        let ticket = self.authorize(&caller, &Action::Mint, &AuthProof::Direct)?;
        self.mint_ticketed(&ticket, Some(id), owner, caller, value, slot)
    }

    pub(crate) fn mint_ticketed(
        &mut self,
        ticket: &Ticket,
        id: Option<TokenId>,
        owner: Address,
        issuer: Address,
        value: u64,
        slot: SlotId,
    ) -> Result<TokenId, LedgerError> {
        if value == 0 {
            return Err(LedgerError::ZeroValue);
        }
        if slot.is_zero() {
            return Err(LedgerError::UnsetSlot);
        }
        if owner.is_zero() {
            return Err(LedgerError::ZeroAddress("owner"));
        }
        let id = match id {
            Some(id) if self.store.contains(&id) => return Err(LedgerError::DuplicateToken(id)),
            Some(id) => id,
            None => self.store.peek_next_id()?,
        };

        self.store
            .insert(Token::new(id, owner, issuer, value, slot));
        self.redeem(ticket);

        info!(token = %id, owner = %owner, issuer = %issuer, value, slot = %slot, "token minted");
        self.events.push(LedgerEvent::Minted {
            owner,
            token: id,
            value,
        });
        self.events.push(LedgerEvent::SlotChanged {
            token: id,
            old_slot: SlotId::ZERO,
            new_slot: slot,
        });
        Ok(id)
    }

    // ── Value ────────────────────────────────────────────────────────

    /// Add `value` to a token. Issuer only; the token must be valid.
    pub fn charge(&mut self, caller: Address, token: TokenId, value: u64) -> Result<(), LedgerError> {
        self.authorize(&caller, &Action::Charge(token), &AuthProof::Direct)?;
        if value == 0 {
            return Err(LedgerError::ZeroValue);
        }
        let record = self.store.get_mut(&token)?;
        if !record.valid {
            return Err(LedgerError::TokenRevoked {
                token,
                action: "be charged",
            });
        }
        record.value = record
            .value
            .checked_add(value)
            .ok_or(LedgerError::ValueOverflow {
                token,
                current: record.value,
                added: value,
            })?;
        info!(token = %token, value, balance = record.value, caller = %caller, "token charged");
        self.events.push(LedgerEvent::Charged { token, value });
        Ok(())
    }

    /// Remove `value` from a token. Issuer only; the token must be valid and
    /// hold at least `value`.
    pub fn consume(&mut self, caller: Address, token: TokenId, value: u64) -> Result<(), LedgerError> {
        self.authorize(&caller, &Action::Consume(token), &AuthProof::Direct)?;
        if value == 0 {
            return Err(LedgerError::ZeroValue);
        }
        let record = self.store.get_mut(&token)?;
        if !record.valid {
            return Err(LedgerError::TokenRevoked {
                token,
                action: "be consumed",
            });
        }
        if value > record.value {
            return Err(LedgerError::InsufficientValue {
                token,
                requested: value,
                available: record.value,
            });
        }
        record.value -= value;
        info!(token = %token, value, balance = record.value, caller = %caller, "token consumed");
        self.events.push(LedgerEvent::Consumed { token, value });
        Ok(())
    }

    // ── Revoke / destroy ─────────────────────────────────────────────

    /// Invalidate a token. Issuer only. Terminal.
    pub fn revoke(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.revoke_with(caller, token, AuthProof::Direct)
    }

    /// Invalidate a token under any proof the gate accepts for revocation.
    pub fn revoke_with(
        &mut self,
        caller: Address,
        token: TokenId,
        proof: AuthProof,
    ) -> Result<(), LedgerError> {
        let ticket = self.authorize(&caller, &Action::Revoke(token), &proof)?;
        let record = self.store.get_mut(&token)?;
        record.valid = false;
        let owner = record.owner;
        self.redeem(&ticket);
        info!(token = %token, owner = %owner, caller = %caller, proof = ?proof, "token revoked");
        self.events.push(LedgerEvent::Revoked { owner, token });
        Ok(())
    }

    /// Remove a token record and every index entry. Issuer only. The id
    /// becomes free for an explicit mint.
    pub fn destroy(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.authorize(&caller, &Action::Destroy(token), &AuthProof::Direct)?;
        let record = self
            .store
            .remove(&token)
            .ok_or(LedgerError::TokenNotFound(token))?;
        self.delegation.purge_token(&token);
        info!(token = %token, owner = %record.owner, caller = %caller, "token destroyed");
        self.events.push(LedgerEvent::Destroyed {
            owner: record.owner,
            token,
        });
        Ok(())
    }

    // ── Slot ─────────────────────────────────────────────────────────

    /// Move a valid token to another slot. Owner or issuer.
    pub fn set_slot(
        &mut self,
        caller: Address,
        token: TokenId,
        new_slot: SlotId,
    ) -> Result<(), LedgerError> {
        if new_slot.is_zero() {
            return Err(LedgerError::UnsetSlot);
        }
        let record = self.store.get(&token)?;
        if record.owner != caller && record.issuer != caller {
            return Err(LedgerError::Unauthorized {
                caller,
                action: "set slot",
            });
        }
        if !record.valid {
            return Err(LedgerError::TokenRevoked {
                token,
                action: "change slot",
            });
        }
        if record.slot == new_slot {
            return Ok(());
        }
        let old_slot = self.store.move_to_slot(&token, new_slot)?;
        info!(token = %token, old_slot = %old_slot, new_slot = %new_slot, caller = %caller, "slot changed");
        self.events.push(LedgerEvent::SlotChanged {
            token,
            old_slot,
            new_slot,
        });
        Ok(())
    }

    // ── Point queries ────────────────────────────────────────────────

    /// The full token record, ignoring visibility.
    pub fn token(&self, id: &TokenId) -> Result<&Token, LedgerError> {
        self.store.get(id)
    }

    /// Current value.
    pub fn value_of(&self, id: &TokenId) -> Result<u64, LedgerError> {
        Ok(self.store.get(id)?.value)
    }

    /// Current slot.
    pub fn slot_of(&self, id: &TokenId) -> Result<SlotId, LedgerError> {
        Ok(self.store.get(id)?.slot)
    }

    /// Current owner.
    pub fn owner_of(&self, id: &TokenId) -> Result<Address, LedgerError> {
        Ok(self.store.get(id)?.owner)
    }

    /// Issuer.
    pub fn issuer_of(&self, id: &TokenId) -> Result<Address, LedgerError> {
        Ok(self.store.get(id)?.issuer)
    }

    /// False once revoked. Unaffected by expiry.
    pub fn is_valid(&self, id: &TokenId) -> Result<bool, LedgerError> {
        Ok(self.store.get(id)?.valid)
    }

    /// Number of tokens held by `owner`. Fails with `NoTokens` when zero;
    /// see [`Self::token_count_of`] for the non-failing form.
    pub fn balance_of(&self, owner: &Address) -> Result<usize, LedgerError> {
        match self.store.tokens_of(owner).len() {
            0 => Err(LedgerError::NoTokens(*owner)),
            n => Ok(n),
        }
    }

    /// Number of tokens held by `owner`, zero included.
    pub fn token_count_of(&self, owner: &Address) -> usize {
        self.store.tokens_of(owner).len()
    }

    // ── Enumeration ──────────────────────────────────────────────────

    /// Number of extant tokens.
    pub fn total_supply(&self) -> Result<usize, LedgerError> {
        self.require(Capability::Enumerable)?;
        Ok(self.store.total_supply())
    }

    /// The `index`-th token in global order.
    pub fn token_by_index(&self, index: usize) -> Result<TokenId, LedgerError> {
        self.require(Capability::Enumerable)?;
        self.store.token_by_index(index)
    }

    /// The `index`-th token of `owner`.
    pub fn token_of_owner_by_index(
        &self,
        owner: &Address,
        index: usize,
    ) -> Result<TokenId, LedgerError> {
        self.require(Capability::Enumerable)?;
        self.store.token_of_owner_by_index(owner, index)
    }

    /// All tokens of `owner`, in acquisition order.
    pub fn tokens_of(&self, owner: &Address) -> Result<Vec<TokenId>, LedgerError> {
        self.require(Capability::Enumerable)?;
        Ok(self.store.tokens_of(owner).to_vec())
    }

    /// Number of slots in use.
    pub fn slot_count(&self) -> Result<usize, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        Ok(self.store.slot_count())
    }

    /// The `index`-th slot in order of first use.
    pub fn slot_by_index(&self, index: usize) -> Result<SlotId, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        self.store.slot_by_index(index)
    }

    /// Number of tokens in `slot`.
    pub fn token_supply_in_slot(&self, slot: &SlotId) -> Result<usize, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        Ok(self.store.tokens_in_slot(slot).len())
    }

    /// The `index`-th token in `slot`.
    pub fn token_in_slot_by_index(
        &self,
        slot: &SlotId,
        index: usize,
    ) -> Result<TokenId, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        at(self.store.tokens_in_slot(slot), index)
    }

    /// Number of distinct owners in `slot`.
    pub fn owner_count_in_slot(&self, slot: &SlotId) -> Result<usize, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        Ok(self.store.owners_in_slot(slot).len())
    }

    /// The `index`-th distinct owner in `slot`.
    pub fn owner_in_slot_by_index(
        &self,
        slot: &SlotId,
        index: usize,
    ) -> Result<Address, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        at(&self.store.owners_in_slot(slot), index)
    }

    /// Number of distinct slots `owner` holds tokens in.
    pub fn slot_count_of_owner(&self, owner: &Address) -> Result<usize, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        Ok(self.store.slots_of_owner(owner).len())
    }

    /// The `index`-th distinct slot of `owner`.
    pub fn slot_of_owner_by_index(
        &self,
        owner: &Address,
        index: usize,
    ) -> Result<SlotId, LedgerError> {
        self.require(Capability::SlotEnumerable)?;
        at(&self.store.slots_of_owner(owner), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    const ADMIN: u8 = 0xaa;
    const OWNER: u8 = 1;

    fn ledger() -> Ledger {
        Ledger::new(LedgerConfig::new("ledger-test", addr(ADMIN))).unwrap()
    }

    // ── Mint ─────────────────────────────────────────────────────────

    #[test]
    fn test_mint_records_issuer_and_events() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 100, SlotId::from(1)).unwrap();
        assert_eq!(id, TokenId::from(1));
        assert_eq!(l.owner_of(&id).unwrap(), addr(OWNER));
        assert_eq!(l.issuer_of(&id).unwrap(), addr(ADMIN));
        assert_eq!(
            l.events(),
            &[
                LedgerEvent::Minted {
                    owner: addr(OWNER),
                    token: id,
                    value: 100
                },
                LedgerEvent::SlotChanged {
                    token: id,
                    old_slot: SlotId::ZERO,
                    new_slot: SlotId::from(1)
                },
            ]
        );
    }

    #[test]
    fn test_mint_rejections() {
        let mut l = ledger();
        assert!(matches!(
            l.mint(addr(OWNER), addr(OWNER), 1, SlotId::from(1)),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(matches!(
            l.mint(addr(ADMIN), addr(OWNER), 0, SlotId::from(1)),
            Err(LedgerError::ZeroValue)
        ));
        assert!(matches!(
            l.mint(addr(ADMIN), addr(OWNER), 1, SlotId::ZERO),
            Err(LedgerError::UnsetSlot)
        ));
        assert!(matches!(
            l.mint(addr(ADMIN), Address::ZERO, 1, SlotId::from(1)),
            Err(LedgerError::ZeroAddress("owner"))
        ));
        assert!(l.events().is_empty());
    }

    #[test]
    fn test_mint_with_id() {
        let mut l = ledger();
        let id = TokenId::from(500);
        l.mint_with_id(addr(ADMIN), id, addr(OWNER), 1, SlotId::from(1))
            .unwrap();
        assert!(matches!(
            l.mint_with_id(addr(ADMIN), id, addr(OWNER), 1, SlotId::from(1)),
            Err(LedgerError::DuplicateToken(_))
        ));
        l.destroy(addr(ADMIN), id).unwrap();
        l.mint_with_id(addr(ADMIN), id, addr(OWNER), 1, SlotId::from(1))
            .unwrap();
    }

    // ── Value ────────────────────────────────────────────────────────

    #[test]
    fn test_charge_and_consume() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 100, SlotId::from(1)).unwrap();
        l.charge(addr(ADMIN), id, 50).unwrap();
        assert_eq!(l.value_of(&id).unwrap(), 150);
        assert!(matches!(
            l.consume(addr(ADMIN), id, 200),
            Err(LedgerError::InsufficientValue {
                requested: 200,
                available: 150,
                ..
            })
        ));
        assert_eq!(l.value_of(&id).unwrap(), 150);
        l.consume(addr(ADMIN), id, 150).unwrap();
        assert_eq!(l.value_of(&id).unwrap(), 0);
    }

    #[test]
    fn test_charge_overflow() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), u64::MAX, SlotId::from(1)).unwrap();
        assert!(matches!(
            l.charge(addr(ADMIN), id, 1),
            Err(LedgerError::ValueOverflow { .. })
        ));
        assert_eq!(l.value_of(&id).unwrap(), u64::MAX);
    }

    #[test]
    fn test_revoked_token_rejects_value_changes() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 10, SlotId::from(1)).unwrap();
        l.revoke(addr(ADMIN), id).unwrap();
        assert!(matches!(
            l.charge(addr(ADMIN), id, 1),
            Err(LedgerError::TokenRevoked { .. })
        ));
        assert!(matches!(
            l.consume(addr(ADMIN), id, 1),
            Err(LedgerError::TokenRevoked { .. })
        ));
        assert_eq!(l.value_of(&id).unwrap(), 10);
    }

    // ── Revoke / destroy ─────────────────────────────────────────────

    #[test]
    fn test_revoke_is_terminal() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 10, SlotId::from(1)).unwrap();
        assert!(matches!(
            l.revoke(addr(OWNER), id),
            Err(LedgerError::Unauthorized { .. })
        ));
        l.revoke(addr(ADMIN), id).unwrap();
        assert!(!l.is_valid(&id).unwrap());
        assert!(matches!(
            l.revoke(addr(ADMIN), id),
            Err(LedgerError::AlreadyRevoked(_))
        ));
        // still queryable
        assert_eq!(l.owner_of(&id).unwrap(), addr(OWNER));
    }

    #[test]
    fn test_destroy_removes_everything() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 10, SlotId::from(1)).unwrap();
        l.destroy(addr(ADMIN), id).unwrap();
        assert!(matches!(l.owner_of(&id), Err(LedgerError::TokenNotFound(_))));
        assert_eq!(l.total_supply().unwrap(), 0);
        assert_eq!(l.slot_count().unwrap(), 0);
        assert!(matches!(l.balance_of(&addr(OWNER)), Err(LedgerError::NoTokens(_))));
        assert_eq!(l.token_count_of(&addr(OWNER)), 0);
        assert_eq!(
            l.events().last(),
            Some(&LedgerEvent::Destroyed {
                owner: addr(OWNER),
                token: id
            })
        );
    }

    // ── Slot ─────────────────────────────────────────────────────────

    #[test]
    fn test_set_slot() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(OWNER), 10, SlotId::from(1)).unwrap();
        assert!(matches!(
            l.set_slot(addr(9), id, SlotId::from(2)),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(matches!(
            l.set_slot(addr(OWNER), id, SlotId::ZERO),
            Err(LedgerError::UnsetSlot)
        ));
        l.set_slot(addr(OWNER), id, SlotId::from(2)).unwrap();
        assert_eq!(l.slot_of(&id).unwrap(), SlotId::from(2));
        assert_eq!(
            l.events().last(),
            Some(&LedgerEvent::SlotChanged {
                token: id,
                old_slot: SlotId::from(1),
                new_slot: SlotId::from(2)
            })
        );
        let n = l.events().len();
        l.set_slot(addr(ADMIN), id, SlotId::from(2)).unwrap();
        assert_eq!(l.events().len(), n);
    }

    // ── Enumeration ──────────────────────────────────────────────────

    #[test]
    fn test_slot_enumeration() {
        let mut l = ledger();
        let a = l.mint(addr(ADMIN), addr(1), 1, SlotId::from(5)).unwrap();
        let b = l.mint(addr(ADMIN), addr(2), 1, SlotId::from(5)).unwrap();
        l.mint(addr(ADMIN), addr(1), 1, SlotId::from(6)).unwrap();
        assert_eq!(l.slot_count().unwrap(), 2);
        assert_eq!(l.token_supply_in_slot(&SlotId::from(5)).unwrap(), 2);
        assert_eq!(l.token_in_slot_by_index(&SlotId::from(5), 1).unwrap(), b);
        assert_eq!(l.owner_count_in_slot(&SlotId::from(5)).unwrap(), 2);
        assert_eq!(l.owner_in_slot_by_index(&SlotId::from(5), 0).unwrap(), addr(1));
        assert_eq!(l.slot_count_of_owner(&addr(1)).unwrap(), 2);
        assert_eq!(l.slot_of_owner_by_index(&addr(1), 1).unwrap(), SlotId::from(6));
        assert_eq!(l.token_of_owner_by_index(&addr(1), 0).unwrap(), a);
        assert!(matches!(
            l.slot_of_owner_by_index(&addr(1), 2),
            Err(LedgerError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_disabled_enumeration() {
        let cfg = LedgerConfig::new("ledger-test", addr(ADMIN)).with_capabilities([Capability::Core]);
        let l = Ledger::new(cfg).unwrap();
        assert!(matches!(
            l.total_supply(),
            Err(LedgerError::Unsupported(Capability::Enumerable))
        ));
        assert!(matches!(
            l.slot_count(),
            Err(LedgerError::Unsupported(Capability::SlotEnumerable))
        ));
        assert!(l.supports_tag("core"));
        assert!(!l.supports_tag("recovery"));
        assert!(!l.supports_tag("nonsense"));
    }

    // ── Snapshots ────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_roundtrip() {
        let mut l = ledger();
        l.mint(addr(ADMIN), addr(1), 7, SlotId::from(3)).unwrap();
        let snap = l.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        let restored = Ledger::from_snapshot(back).unwrap();
        assert_eq!(restored.snapshot(), snap);
    }

    #[test]
    fn test_take_events_drains() {
        let mut l = ledger();
        l.mint(addr(ADMIN), addr(1), 7, SlotId::from(3)).unwrap();
        assert_eq!(l.take_events().len(), 2);
        assert!(l.events().is_empty());
    }
}
