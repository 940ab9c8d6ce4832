//! # Delegation Workflow
//!
//! The administrator and minters ("delegators") file delegate requests that
//! fix owner, value and slot, then grant named operators the one-time right
//! to mint from a request or to revoke a specific token. Using a grant
//! consumes it; a delegate request is consumed by its first mint.
//!
//! Unlike approval requests, a delegate request may carry a zero value. The
//! eventual mint still rejects it.

use std::collections::BTreeMap;

use sbt_core::{Address, RequestId, SlotId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capability::Capability;
use crate::error::{same_length, LedgerError};
use crate::gate::{Action, AuthProof, GrantId, RequestState};
use crate::ledger::Ledger;

/// A request for a delegated mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRequest {
    /// Request id.
    pub id: RequestId,
    /// Filer; becomes the issuer of the minted token.
    pub creator: Address,
    /// Owner of the minted token.
    pub owner: Address,
    /// Value of the minted token.
    pub value: u64,
    /// Slot of the minted token.
    pub slot: SlotId,
    /// Lifecycle state.
    pub state: RequestState,
}

/// Whether a grant can still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    /// Usable once.
    Granted,
    /// Used.
    Consumed,
}

/// Delegate requests and the grants issued against them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationState {
    requests: BTreeMap<RequestId, DelegateRequest>,
    mint_grants: BTreeMap<RequestId, BTreeMap<Address, GrantState>>,
    revoke_grants: BTreeMap<TokenId, BTreeMap<Address, GrantState>>,
    next_request: RequestId,
}

impl Default for DelegationState {
    fn default() -> Self {
        Self {
            requests: BTreeMap::new(),
            mint_grants: BTreeMap::new(),
            revoke_grants: BTreeMap::new(),
            next_request: RequestId::from_u64(1),
        }
    }
}

impl DelegationState {
    /// Look up a request in any state.
    pub fn request(&self, id: &RequestId) -> Result<&DelegateRequest, LedgerError> {
        self.requests.get(id).ok_or(LedgerError::RequestNotFound(*id))
    }

    /// Whether `operator` holds an unused mint grant for `request`.
    pub fn holds_mint_grant(&self, request: &RequestId, operator: &Address) -> bool {
        self.mint_grants
            .get(request)
            .and_then(|grants| grants.get(operator))
            == Some(&GrantState::Granted)
    }

    /// Whether `operator` holds an unused revoke grant for `token`.
    pub fn holds_revoke_grant(&self, token: &TokenId, operator: &Address) -> bool {
        self.ensure_revoke_grant(token, operator).is_ok()
    }

    pub(crate) fn ensure_revoke_grant(
        &self,
        token: &TokenId,
        operator: &Address,
    ) -> Result<(), LedgerError> {
        match self.revoke_grants.get(token).and_then(|g| g.get(operator)) {
            Some(GrantState::Granted) => Ok(()),
            Some(GrantState::Consumed) => Err(LedgerError::GrantConsumed {
                operator: *operator,
                token: *token,
            }),
            None => Err(LedgerError::NotDelegated {
                caller: *operator,
                target: format!("token {token}"),
            }),
        }
    }

    /// Consumes the request along with the operator's grant.
    pub(crate) fn consume_mint(&mut self, request: &RequestId, operator: &Address) {
        if let Some(req) = self.requests.get_mut(request) {
            req.state = RequestState::Consumed;
        }
        if let Some(grant) = self
            .mint_grants
            .get_mut(request)
            .and_then(|g| g.get_mut(operator))
        {
            *grant = GrantState::Consumed;
        }
    }

    pub(crate) fn consume_revoke(&mut self, token: &TokenId, operator: &Address) {
        if let Some(grant) = self
            .revoke_grants
            .get_mut(token)
            .and_then(|g| g.get_mut(operator))
        {
            *grant = GrantState::Consumed;
        }
    }

    /// Drop revoke grants for a destroyed token, so a later token minted
    /// under the same id does not inherit them.
    pub(crate) fn purge_token(&mut self, token: &TokenId) {
        self.revoke_grants.remove(token);
    }
}

impl Ledger {
    fn ensure_delegator(&self, caller: &Address, action: &'static str) -> Result<(), LedgerError> {
        if self.config.is_minter(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: *caller,
                action,
            })
        }
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// File a delegate request fixing owner, value and slot.
    pub fn create_delegate_request(
        &mut self,
        caller: Address,
        owner: Address,
        value: u64,
        slot: SlotId,
    ) -> Result<RequestId, LedgerError> {
        self.require(Capability::Delegation)?;
        self.ensure_delegator(&caller, "create delegate request")?;
        let del = &mut self.delegation;
        let id = del.next_request;
        let next = id.checked_next().ok_or(LedgerError::IdSpaceExhausted)?;
        del.requests.insert(
            id,
            DelegateRequest {
                id,
                creator: caller,
                owner,
                value,
                slot,
                state: RequestState::Pending,
            },
        );
        del.next_request = next;
        debug!(request = %id, creator = %caller, owner = %owner, value, slot = %slot, "delegate request created");
        Ok(id)
    }

    /// Look up a delegate request.
    pub fn delegate_request(&self, id: &RequestId) -> Result<&DelegateRequest, LedgerError> {
        self.delegation.request(id)
    }

    /// Withdraw a delegate request. Creator only.
    pub fn remove_delegate_request(
        &mut self,
        caller: Address,
        id: RequestId,
    ) -> Result<(), LedgerError> {
        self.require(Capability::Delegation)?;
        let req = self.delegation.request(&id)?;
        if req.creator != caller {
            return Err(LedgerError::NotCreator {
                caller,
                request: id,
            });
        }
        req.state.ensure_removable(id)?;
        if let Some(req) = self.delegation.requests.get_mut(&id) {
            req.state = RequestState::Removed;
        }
        debug!(request = %id, "delegate request removed");
        Ok(())
    }

    // ── Grants ───────────────────────────────────────────────────────

    /// Grant `operator` the right to mint once from `request`.
    pub fn mint_delegate(
        &mut self,
        caller: Address,
        operator: Address,
        request: RequestId,
    ) -> Result<(), LedgerError> {
        self.mint_delegate_batch(caller, &[operator], &[request])
    }

    /// Grant each `operators[i]` the right to mint once from `requests[i]`.
    /// Every pair is validated before any grant is recorded.
    pub fn mint_delegate_batch(
        &mut self,
        caller: Address,
        operators: &[Address],
        requests: &[RequestId],
    ) -> Result<(), LedgerError> {
        self.require(Capability::Delegation)?;
        self.ensure_delegator(&caller, "grant mint delegation")?;
        same_length(operators, requests)?;
        for request in requests {
            self.delegation.request(request)?.state.ensure_pending(*request)?;
        }
        for (operator, request) in operators.iter().zip(requests) {
            self.delegation
                .mint_grants
                .entry(*request)
                .or_default()
                .insert(*operator, GrantState::Granted);
            info!(operator = %operator, request = %request, caller = %caller, "mint delegation granted");
        }
        Ok(())
    }

    /// Grant `operator` the right to revoke `token` once.
    pub fn revoke_delegate(
        &mut self,
        caller: Address,
        operator: Address,
        token: TokenId,
    ) -> Result<(), LedgerError> {
        self.revoke_delegate_batch(caller, &[operator], &[token])
    }

    /// Grant each `operators[i]` the right to revoke `tokens[i]` once.
    /// Every pair is validated before any grant is recorded.
    pub fn revoke_delegate_batch(
        &mut self,
        caller: Address,
        operators: &[Address],
        tokens: &[TokenId],
    ) -> Result<(), LedgerError> {
        self.require(Capability::Delegation)?;
        self.ensure_delegator(&caller, "grant revoke delegation")?;
        same_length(operators, tokens)?;
        for token in tokens {
            if !self.store.get(token)?.valid {
                return Err(LedgerError::AlreadyRevoked(*token));
            }
        }
        for (operator, token) in operators.iter().zip(tokens) {
            self.delegation
                .revoke_grants
                .entry(*token)
                .or_default()
                .insert(*operator, GrantState::Granted);
            info!(operator = %operator, token = %token, caller = %caller, "revoke delegation granted");
        }
        Ok(())
    }

    // ── Operator actions ─────────────────────────────────────────────

    /// Mint from a delegate request. Only a granted operator; consumes the
    /// request and the grant.
    pub fn delegate_mint(
        &mut self,
        caller: Address,
        request: RequestId,
    ) -> Result<TokenId, LedgerError> {
        self.require(Capability::Delegation)?;
        let ticket = self.authorize(
            &caller,
            &Action::Mint,
            &AuthProof::Delegated(GrantId::Mint(request)),
        )?;
        let terms = ticket.mint_terms().ok_or(LedgerError::Unauthorized {
            caller,
            action: "mint",
        })?;
        let owner = terms.owner.ok_or(LedgerError::Unauthorized {
            caller,
            action: "mint",
        })?;
        self.mint_ticketed(&ticket, None, owner, terms.issuer, terms.value, terms.slot)
    }

    /// Revoke a token under a revoke grant. Consumes the grant.
    pub fn delegate_revoke(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.require(Capability::Delegation)?;
        self.revoke_with(caller, token, AuthProof::Delegated(GrantId::Revoke(token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    const ADMIN: u8 = 0xaa;
    const MINTER: u8 = 0xcc;
    const OPERATOR: u8 = 0x0d;

    fn ledger() -> Ledger {
        let cfg = LedgerConfig::new("delegation-test", addr(ADMIN)).with_minter(addr(MINTER));
        Ledger::new(cfg).unwrap()
    }

    // ── Requests ─────────────────────────────────────────────────────

    #[test]
    fn test_create_requires_delegator() {
        let mut l = ledger();
        assert!(matches!(
            l.create_delegate_request(addr(1), addr(2), 5, SlotId::from(1)),
            Err(LedgerError::Unauthorized { .. })
        ));
        l.create_delegate_request(addr(MINTER), addr(2), 5, SlotId::from(1))
            .unwrap();
    }

    #[test]
    fn test_zero_value_request_accepted_but_mint_rejected() {
        let mut l = ledger();
        let req = l
            .create_delegate_request(addr(ADMIN), addr(2), 0, SlotId::from(1))
            .unwrap();
        l.mint_delegate(addr(ADMIN), addr(OPERATOR), req).unwrap();
        assert!(matches!(
            l.delegate_mint(addr(OPERATOR), req),
            Err(LedgerError::ZeroValue)
        ));
        // the failed mint left the grant usable
        assert!(l.delegation.holds_mint_grant(&req, &addr(OPERATOR)));
    }

    // ── Mint grants ──────────────────────────────────────────────────

    #[test]
    fn test_delegate_mint_is_single_use() {
        let mut l = ledger();
        let req = l
            .create_delegate_request(addr(MINTER), addr(2), 25, SlotId::from(4))
            .unwrap();
        assert!(matches!(
            l.delegate_mint(addr(OPERATOR), req),
            Err(LedgerError::NotDelegated { .. })
        ));
        l.mint_delegate(addr(MINTER), addr(OPERATOR), req).unwrap();
        let id = l.delegate_mint(addr(OPERATOR), req).unwrap();
        let token = l.token(&id).unwrap();
        assert_eq!(token.owner, addr(2));
        assert_eq!(token.issuer, addr(MINTER));
        assert_eq!(token.value, 25);
        assert!(matches!(
            l.delegate_mint(addr(OPERATOR), req),
            Err(LedgerError::RequestAlreadyConsumed(_))
        ));
    }

    #[test]
    fn test_grant_on_consumed_request_rejected() {
        let mut l = ledger();
        let req = l
            .create_delegate_request(addr(MINTER), addr(2), 25, SlotId::from(4))
            .unwrap();
        l.mint_delegate(addr(MINTER), addr(OPERATOR), req).unwrap();
        l.delegate_mint(addr(OPERATOR), req).unwrap();
        assert!(matches!(
            l.mint_delegate(addr(MINTER), addr(9), req),
            Err(LedgerError::RequestAlreadyConsumed(_))
        ));
    }

    #[test]
    fn test_mint_delegate_batch_is_all_or_nothing() {
        let mut l = ledger();
        let req = l
            .create_delegate_request(addr(MINTER), addr(2), 25, SlotId::from(4))
            .unwrap();
        assert!(matches!(
            l.mint_delegate_batch(addr(MINTER), &[addr(1), addr(2)], &[req]),
            Err(LedgerError::LengthMismatch { left: 2, right: 1 })
        ));
        assert!(matches!(
            l.mint_delegate_batch(
                addr(MINTER),
                &[addr(1), addr(2)],
                &[req, RequestId::from(99)]
            ),
            Err(LedgerError::RequestNotFound(_))
        ));
        assert!(!l.delegation.holds_mint_grant(&req, &addr(1)));
    }

    #[test]
    fn test_remove_delegate_request() {
        let mut l = ledger();
        let req = l
            .create_delegate_request(addr(MINTER), addr(2), 25, SlotId::from(4))
            .unwrap();
        assert!(matches!(
            l.remove_delegate_request(addr(ADMIN), req),
            Err(LedgerError::NotCreator { .. })
        ));
        assert!(matches!(
            l.remove_delegate_request(addr(MINTER), RequestId::from(42)),
            Err(LedgerError::RequestNotFound(_))
        ));
        l.mint_delegate(addr(MINTER), addr(OPERATOR), req).unwrap();
        l.remove_delegate_request(addr(MINTER), req).unwrap();
        assert!(matches!(
            l.delegate_mint(addr(OPERATOR), req),
            Err(LedgerError::RequestRemoved(_))
        ));
    }

    // ── Revoke grants ────────────────────────────────────────────────

    #[test]
    fn test_delegate_revoke() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(1), 10, SlotId::from(1)).unwrap();
        assert!(matches!(
            l.delegate_revoke(addr(OPERATOR), id),
            Err(LedgerError::NotDelegated { .. })
        ));
        l.revoke_delegate(addr(ADMIN), addr(OPERATOR), id).unwrap();
        l.delegate_revoke(addr(OPERATOR), id).unwrap();
        assert!(!l.is_valid(&id).unwrap());
        assert!(matches!(
            l.delegate_revoke(addr(OPERATOR), id),
            Err(LedgerError::GrantConsumed { .. })
        ));
    }

    #[test]
    fn test_revoke_grant_requires_live_token() {
        let mut l = ledger();
        assert!(matches!(
            l.revoke_delegate(addr(ADMIN), addr(OPERATOR), TokenId::from(5)),
            Err(LedgerError::TokenNotFound(_))
        ));
        let id = l.mint(addr(ADMIN), addr(1), 10, SlotId::from(1)).unwrap();
        l.revoke(addr(ADMIN), id).unwrap();
        assert!(matches!(
            l.revoke_delegate(addr(ADMIN), addr(OPERATOR), id),
            Err(LedgerError::AlreadyRevoked(_))
        ));
    }

    #[test]
    fn test_revoke_delegate_batch_is_all_or_nothing() {
        let mut l = ledger();
        let live = l.mint(addr(ADMIN), addr(1), 10, SlotId::from(1)).unwrap();
        let dead = l.mint(addr(ADMIN), addr(2), 10, SlotId::from(1)).unwrap();
        l.revoke(addr(ADMIN), dead).unwrap();
        let before = l.snapshot();

        assert!(matches!(
            l.revoke_delegate_batch(
                addr(ADMIN),
                &[addr(OPERATOR), addr(OPERATOR)],
                &[live, dead]
            ),
            Err(LedgerError::AlreadyRevoked(t)) if t == dead
        ));
        assert!(matches!(
            l.revoke_delegate_batch(addr(ADMIN), &[addr(OPERATOR)], &[live, dead]),
            Err(LedgerError::LengthMismatch { left: 1, right: 2 })
        ));
        assert!(matches!(
            l.revoke_delegate_batch(
                addr(ADMIN),
                &[addr(OPERATOR), addr(OPERATOR)],
                &[live, TokenId::from(99)]
            ),
            Err(LedgerError::TokenNotFound(_))
        ));

        assert!(!l.delegation.holds_revoke_grant(&live, &addr(OPERATOR)));
        assert_eq!(l.snapshot(), before);
        assert!(matches!(
            l.delegate_revoke(addr(OPERATOR), live),
            Err(LedgerError::NotDelegated { .. })
        ));
    }

    #[test]
    fn test_destroy_purges_revoke_grants() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(1), 10, SlotId::from(1)).unwrap();
        l.revoke_delegate(addr(ADMIN), addr(OPERATOR), id).unwrap();
        l.destroy(addr(ADMIN), id).unwrap();
        l.mint_with_id(addr(ADMIN), id, addr(1), 10, SlotId::from(1))
            .unwrap();
        assert!(!l.delegation.holds_revoke_grant(&id, &addr(OPERATOR)));
    }
}
