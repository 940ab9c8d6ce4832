//! # Ledger Store
//!
//! Primary token table plus the secondary indices over it:
//!
//! - global order (`all_tokens`)
//! - per-owner order (`owner_tokens`)
//! - slot order (`slots`) and per-slot order (`slot_tokens`)
//!
//! The mutators here perform no authorization and assume their
//! preconditions were checked by the caller. Each one updates every affected
//! index before returning, so no reader ever sees a half-applied change.
//!
//! Orders are insertion orders. Removal shifts later entries down, so
//! enumeration by index stays dense.

use std::collections::{BTreeMap, BTreeSet};

use sbt_core::{Address, SlotId, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::{at, LedgerError};
use crate::token::Token;

/// Token records and their indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStore {
    tokens: BTreeMap<TokenId, Token>,
    all_tokens: Vec<TokenId>,
    owner_tokens: BTreeMap<Address, Vec<TokenId>>,
    slots: Vec<SlotId>,
    slot_tokens: BTreeMap<SlotId, Vec<TokenId>>,
    next_id: TokenId,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self {
            tokens: BTreeMap::new(),
            all_tokens: Vec::new(),
            owner_tokens: BTreeMap::new(),
            slots: Vec::new(),
            slot_tokens: BTreeMap::new(),
            next_id: TokenId::from_u64(1),
        }
    }
}

impl LedgerStore {
    /// Create an empty store. Sequential ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Point queries ────────────────────────────────────────────────

    /// Look up a token.
    pub fn get(&self, id: &TokenId) -> Result<&Token, LedgerError> {
        self.tokens.get(id).ok_or(LedgerError::TokenNotFound(*id))
    }

    pub(crate) fn get_mut(&mut self, id: &TokenId) -> Result<&mut Token, LedgerError> {
        self.tokens.get_mut(id).ok_or(LedgerError::TokenNotFound(*id))
    }

    /// Whether a token with this id exists.
    pub fn contains(&self, id: &TokenId) -> bool {
        self.tokens.contains_key(id)
    }

    /// Iterate tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    // ── Enumeration ──────────────────────────────────────────────────

    /// Number of extant tokens.
    pub fn total_supply(&self) -> usize {
        self.all_tokens.len()
    }

    /// The `index`-th token in global order.
    pub fn token_by_index(&self, index: usize) -> Result<TokenId, LedgerError> {
        at(&self.all_tokens, index)
    }

    /// Tokens held by `owner`, in acquisition order.
    pub fn tokens_of(&self, owner: &Address) -> &[TokenId] {
        self.owner_tokens.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The `index`-th token of `owner`.
    pub fn token_of_owner_by_index(
        &self,
        owner: &Address,
        index: usize,
    ) -> Result<TokenId, LedgerError> {
        at(self.tokens_of(owner), index)
    }

    /// Number of distinct slots in use.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The `index`-th slot in order of first use.
    pub fn slot_by_index(&self, index: usize) -> Result<SlotId, LedgerError> {
        at(&self.slots, index)
    }

    /// Tokens in `slot`, in insertion order.
    pub fn tokens_in_slot(&self, slot: &SlotId) -> &[TokenId] {
        self.slot_tokens.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct owners with a token in `slot`, in order of first appearance.
    pub fn owners_in_slot(&self, slot: &SlotId) -> Vec<Address> {
        let mut seen = BTreeSet::new();
        self.tokens_in_slot(slot)
            .iter()
            .filter_map(|id| self.tokens.get(id))
            .map(|t| t.owner)
            .filter(|owner| seen.insert(*owner))
            .collect()
    }

    /// Distinct slots `owner` holds a token in, in order of first appearance.
    pub fn slots_of_owner(&self, owner: &Address) -> Vec<SlotId> {
        let mut seen = BTreeSet::new();
        self.tokens_of(owner)
            .iter()
            .filter_map(|id| self.tokens.get(id))
            .map(|t| t.slot)
            .filter(|slot| seen.insert(*slot))
            .collect()
    }

    // ── Id allocation ────────────────────────────────────────────────

    /// The id the next sequential mint would receive.
    ///
    /// Skips ids taken by explicit mints. The counter never moves backwards,
    /// so a destroyed id is only reused through an explicit mint.
    pub fn peek_next_id(&self) -> Result<TokenId, LedgerError> {
        let mut id = self.next_id;
        while self.tokens.contains_key(&id) {
            id = id.checked_next().ok_or(LedgerError::IdSpaceExhausted)?;
        }
        Ok(id)
    }

    // ── Mutators ─────────────────────────────────────────────────────

    /// Insert a freshly minted token. The id must be free and the slot
    /// non-zero.
    pub(crate) fn insert(&mut self, token: Token) {
        let id = token.id;
        if id >= self.next_id {
            self.next_id = id.checked_next().unwrap_or(id);
        }
        self.all_tokens.push(id);
        self.owner_tokens.entry(token.owner).or_default().push(id);
        self.attach_to_slot(id, token.slot);
        self.tokens.insert(id, token);
    }

    /// Remove a token and every index entry that references it.
    pub(crate) fn remove(&mut self, id: &TokenId) -> Option<Token> {
        let token = self.tokens.remove(id)?;
        remove_from(&mut self.all_tokens, id);
        if let Some(owned) = self.owner_tokens.get_mut(&token.owner) {
            remove_from(owned, id);
            if owned.is_empty() {
                self.owner_tokens.remove(&token.owner);
            }
        }
        self.detach_from_slot(id, token.slot);
        Some(token)
    }

    /// Move a token to another slot, returning the previous slot.
    pub(crate) fn move_to_slot(
        &mut self,
        id: &TokenId,
        new_slot: SlotId,
    ) -> Result<SlotId, LedgerError> {
        let token = self.get_mut(id)?;
        let old_slot = token.slot;
        if old_slot == new_slot {
            return Ok(old_slot);
        }
        token.slot = new_slot;
        self.detach_from_slot(id, old_slot);
        self.attach_to_slot(*id, new_slot);
        Ok(old_slot)
    }

    /// Rebind every token of `from` to `to`, preserving their order and
    /// appending them after anything `to` already holds.
    pub(crate) fn rebind_owner(&mut self, from: &Address, to: Address) -> Vec<TokenId> {
        let moved = self.owner_tokens.remove(from).unwrap_or_default();
        for id in &moved {
            if let Some(token) = self.tokens.get_mut(id) {
                token.owner = to;
            }
        }
        if !moved.is_empty() {
            self.owner_tokens
                .entry(to)
                .or_default()
                .extend(moved.iter().copied());
        }
        moved
    }

    fn attach_to_slot(&mut self, id: TokenId, slot: SlotId) {
        let members = self.slot_tokens.entry(slot).or_default();
        if members.is_empty() {
            self.slots.push(slot);
        }
        members.push(id);
    }

    fn detach_from_slot(&mut self, id: &TokenId, slot: SlotId) {
        if let Some(members) = self.slot_tokens.get_mut(&slot) {
            remove_from(members, id);
            if members.is_empty() {
                self.slot_tokens.remove(&slot);
                self.slots.retain(|s| *s != slot);
            }
        }
    }

    // ── Audit ────────────────────────────────────────────────────────

    /// Verify every index against the token table.
    pub fn check_consistency(&self) -> Result<(), LedgerError> {
        let corrupt = |msg: String| Err(LedgerError::IndexCorrupted(msg));

        if self.all_tokens.len() != self.tokens.len() {
            return corrupt(format!(
                "global index holds {} entries for {} tokens",
                self.all_tokens.len(),
                self.tokens.len()
            ));
        }
        let global: BTreeSet<_> = self.all_tokens.iter().collect();
        if global.len() != self.all_tokens.len() {
            return corrupt("global index contains duplicates".into());
        }

        let mut owned = 0usize;
        for (owner, ids) in &self.owner_tokens {
            if ids.is_empty() {
                return corrupt(format!("empty owner entry for {owner}"));
            }
            for id in ids {
                match self.tokens.get(id) {
                    Some(t) if t.owner == *owner => owned += 1,
                    Some(t) => {
                        return corrupt(format!(
                            "token {id} indexed under {owner} but owned by {}",
                            t.owner
                        ))
                    }
                    None => return corrupt(format!("owner index references missing token {id}")),
                }
            }
        }
        if owned != self.tokens.len() {
            return corrupt(format!(
                "owner index covers {owned} of {} tokens",
                self.tokens.len()
            ));
        }

        let mut slotted = 0usize;
        for (slot, ids) in &self.slot_tokens {
            if slot.is_zero() {
                return corrupt("slot index contains the unset slot".into());
            }
            if ids.is_empty() {
                return corrupt(format!("empty slot entry for {slot}"));
            }
            for id in ids {
                match self.tokens.get(id) {
                    Some(t) if t.slot == *slot => slotted += 1,
                    _ => return corrupt(format!("slot {slot} lists token {id} it does not hold")),
                }
            }
        }
        if slotted != self.tokens.len() {
            return corrupt(format!(
                "slot index covers {slotted} of {} tokens",
                self.tokens.len()
            ));
        }

        let referenced: BTreeSet<SlotId> = self.tokens.values().map(|t| t.slot).collect();
        let listed: BTreeSet<SlotId> = self.slots.iter().copied().collect();
        if listed.len() != self.slots.len() || listed != referenced {
            return corrupt("slot list differs from the slots referenced by tokens".into());
        }

        for (id, token) in &self.tokens {
            if token.id != *id {
                return corrupt(format!("token keyed {id} carries id {}", token.id));
            }
        }
        Ok(())
    }
}

fn remove_from(list: &mut Vec<TokenId>, id: &TokenId) {
    if let Some(pos) = list.iter().position(|x| x == id) {
        list.remove(pos);
    }
}
