//! # Governance Workflow
//!
//! The administrator manages a voter set. Anyone may file an approval
//! request naming a value and slot; any single voter may then mint from it
//! once, choosing the owner. Voters may also revoke any valid token.
//!
//! There is no quorum: one voter call authorizes one action. An N-of-M
//! scheme would track approvals per request before issuing the ticket.

use std::collections::{BTreeMap, BTreeSet};

use sbt_core::{Address, RequestId, SlotId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capability::Capability;
use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::gate::{Action, AuthProof, RequestState};
use crate::ledger::Ledger;

/// A request for a voter-approved mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request id.
    pub id: RequestId,
    /// Filer; becomes the issuer of the minted token.
    pub creator: Address,
    /// Requested value.
    pub value: u64,
    /// Requested slot.
    pub slot: SlotId,
    /// Lifecycle state.
    pub state: RequestState,
}

/// Voters and approval requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceState {
    voters: BTreeSet<Address>,
    requests: BTreeMap<RequestId, ApprovalRequest>,
    next_request: RequestId,
}

impl GovernanceState {
    pub(crate) fn new(voters: impl IntoIterator<Item = Address>) -> Self {
        Self {
            voters: voters.into_iter().collect(),
            requests: BTreeMap::new(),
            next_request: RequestId::from_u64(1),
        }
    }

    /// Whether `addr` is a current voter.
    pub fn is_voter(&self, addr: &Address) -> bool {
        self.voters.contains(addr)
    }

    /// Current voters in address order.
    pub fn voters(&self) -> impl Iterator<Item = &Address> {
        self.voters.iter()
    }

    /// Look up a request in any state.
    pub fn request(&self, id: &RequestId) -> Result<&ApprovalRequest, LedgerError> {
        self.requests.get(id).ok_or(LedgerError::RequestNotFound(*id))
    }

    pub(crate) fn consume(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.state = RequestState::Consumed;
        }
    }
}

impl Ledger {
    // ── Voter management ─────────────────────────────────────────────

    /// Add a voter. Administrator only.
    pub fn add_voter(&mut self, caller: Address, voter: Address) -> Result<(), LedgerError> {
        self.require(Capability::Governance)?;
        self.ensure_administrator(&caller)?;
        if voter.is_zero() {
            return Err(LedgerError::ZeroAddress("voter"));
        }
        if !self.governance.voters.insert(voter) {
            return Err(LedgerError::DuplicateVoter(voter));
        }
        info!(voter = %voter, "voter added");
        self.events.push(LedgerEvent::VoterAdded { voter });
        Ok(())
    }

    /// Remove a voter. Administrator only.
    pub fn remove_voter(&mut self, caller: Address, voter: Address) -> Result<(), LedgerError> {
        self.require(Capability::Governance)?;
        self.ensure_administrator(&caller)?;
        if !self.governance.voters.remove(&voter) {
            return Err(LedgerError::UnknownVoter(voter));
        }
        info!(voter = %voter, "voter removed");
        self.events.push(LedgerEvent::VoterRemoved { voter });
        Ok(())
    }

    /// Whether `addr` is a current voter.
    pub fn is_voter(&self, addr: &Address) -> bool {
        self.governance.is_voter(addr)
    }

    /// Current voters in address order.
    pub fn voters(&self) -> Vec<Address> {
        self.governance.voters().copied().collect()
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// File an approval request. Open to any caller.
    pub fn create_approval_request(
        &mut self,
        caller: Address,
        value: u64,
        slot: SlotId,
    ) -> Result<RequestId, LedgerError> {
        self.require(Capability::Governance)?;
        if value == 0 {
            return Err(LedgerError::ZeroValue);
        }
        if slot.is_zero() {
            return Err(LedgerError::UnsetSlot);
        }
        let gov = &mut self.governance;
        let id = gov.next_request;
        let next = id.checked_next().ok_or(LedgerError::IdSpaceExhausted)?;
        gov.requests.insert(
            id,
            ApprovalRequest {
                id,
                creator: caller,
                value,
                slot,
                state: RequestState::Pending,
            },
        );
        gov.next_request = next;
        debug!(request = %id, creator = %caller, value, slot = %slot, "approval request created");
        Ok(id)
    }

    /// Look up an approval request.
    pub fn approval_request(&self, id: &RequestId) -> Result<&ApprovalRequest, LedgerError> {
        self.governance.request(id)
    }

    /// Withdraw an approval request. Creator only.
    pub fn remove_approval_request(
        &mut self,
        caller: Address,
        id: RequestId,
    ) -> Result<(), LedgerError> {
        self.require(Capability::Governance)?;
        let req = self.governance.request(&id)?;
        if req.creator != caller {
            return Err(LedgerError::NotCreator {
                caller,
                request: id,
            });
        }
        req.state.ensure_removable(id)?;
        if let Some(req) = self.governance.requests.get_mut(&id) {
            req.state = RequestState::Removed;
        }
        debug!(request = %id, "approval request removed");
        Ok(())
    }

    // ── Voter actions ────────────────────────────────────────────────

    /// Mint to `owner` from an approval request. Voter only; consumes the
    /// request. The token's issuer is the request's creator.
    pub fn approve_mint(
        &mut self,
        caller: Address,
        owner: Address,
        request: RequestId,
    ) -> Result<TokenId, LedgerError> {
        self.require(Capability::Governance)?;
        let ticket = self.authorize(&caller, &Action::Mint, &AuthProof::Governance(Some(request)))?;
        let terms = ticket.mint_terms().ok_or(LedgerError::Unauthorized {
            caller,
            action: "mint",
        })?;
        self.mint_ticketed(&ticket, None, owner, terms.issuer, terms.value, terms.slot)
    }

    /// Revoke any valid token. Voter only.
    pub fn approve_revoke(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.require(Capability::Governance)?;
        self.revoke_with(caller, token, AuthProof::Governance(None))
    }

    pub(crate) fn ensure_administrator(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller == self.config.administrator {
            Ok(())
        } else {
            Err(LedgerError::NotAdministrator(*caller))
        }
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
    const VOTER: u8 = 0xbb;

    fn ledger() -> Ledger {
        let cfg = LedgerConfig::new("gov-test", addr(ADMIN)).with_voter(addr(VOTER));
        Ledger::new(cfg).unwrap()
    }

    // ── Voters ───────────────────────────────────────────────────────

    #[test]
    fn test_voter_management_is_admin_only() {
        let mut l = ledger();
        assert!(matches!(
            l.add_voter(addr(1), addr(2)),
            Err(LedgerError::NotAdministrator(_))
        ));
        l.add_voter(addr(ADMIN), addr(2)).unwrap();
        assert!(l.is_voter(&addr(2)));
        assert!(matches!(
            l.remove_voter(addr(2), addr(VOTER)),
            Err(LedgerError::NotAdministrator(_))
        ));
    }

    #[test]
    fn test_duplicate_and_unknown_voter() {
        let mut l = ledger();
        assert!(matches!(
            l.add_voter(addr(ADMIN), addr(VOTER)),
            Err(LedgerError::DuplicateVoter(_))
        ));
        assert!(matches!(
            l.remove_voter(addr(ADMIN), addr(7)),
            Err(LedgerError::UnknownVoter(_))
        ));
        l.remove_voter(addr(ADMIN), addr(VOTER)).unwrap();
        assert!(l.voters().is_empty());
        assert_eq!(
            l.events().last(),
            Some(&LedgerEvent::VoterRemoved { voter: addr(VOTER) })
        );
    }

    // ── Requests ─────────────────────────────────────────────────────

    #[test]
    fn test_create_request_validation() {
        let mut l = ledger();
        assert!(matches!(
            l.create_approval_request(addr(1), 0, SlotId::from(1)),
            Err(LedgerError::ZeroValue)
        ));
        assert!(matches!(
            l.create_approval_request(addr(1), 5, SlotId::ZERO),
            Err(LedgerError::UnsetSlot)
        ));
        let a = l.create_approval_request(addr(1), 5, SlotId::from(1)).unwrap();
        let b = l.create_approval_request(addr(1), 5, SlotId::from(1)).unwrap();
        assert_eq!(a, RequestId::from(1));
        assert_eq!(b, RequestId::from(2));
    }

    #[test]
    fn test_approve_mint_consumes_request() {
        let mut l = ledger();
        let req = l.create_approval_request(addr(5), 40, SlotId::from(3)).unwrap();
        let id = l.approve_mint(addr(VOTER), addr(9), req).unwrap();
        let token = l.token(&id).unwrap();
        assert_eq!(token.owner, addr(9));
        assert_eq!(token.issuer, addr(5));
        assert_eq!(token.value, 40);
        assert_eq!(l.approval_request(&req).unwrap().state, RequestState::Consumed);
        assert!(matches!(
            l.approve_mint(addr(VOTER), addr(9), req),
            Err(LedgerError::RequestAlreadyConsumed(_))
        ));
    }

    #[test]
    fn test_non_voter_cannot_approve() {
        let mut l = ledger();
        let req = l.create_approval_request(addr(5), 40, SlotId::from(3)).unwrap();
        assert!(matches!(
            l.approve_mint(addr(5), addr(9), req),
            Err(LedgerError::NotVoter(_))
        ));
        assert!(matches!(
            l.approve_mint(addr(VOTER), addr(9), RequestId::from(77)),
            Err(LedgerError::RequestNotFound(_))
        ));
    }

    #[test]
    fn test_remove_request_rules() {
        let mut l = ledger();
        let req = l.create_approval_request(addr(5), 40, SlotId::from(3)).unwrap();
        assert!(matches!(
            l.remove_approval_request(addr(6), req),
            Err(LedgerError::NotCreator { .. })
        ));
        l.remove_approval_request(addr(5), req).unwrap();
        assert!(matches!(
            l.approve_mint(addr(VOTER), addr(9), req),
            Err(LedgerError::RequestRemoved(_))
        ));

        let used = l.create_approval_request(addr(5), 40, SlotId::from(3)).unwrap();
        l.approve_mint(addr(VOTER), addr(9), used).unwrap();
        assert!(matches!(
            l.remove_approval_request(addr(5), used),
            Err(LedgerError::AlreadyConsumed(_))
        ));
    }

    #[test]
    fn test_approve_revoke() {
        let mut l = ledger();
        let id = l.mint(addr(ADMIN), addr(1), 10, SlotId::from(1)).unwrap();
        assert!(matches!(
            l.approve_revoke(addr(1), id),
            Err(LedgerError::NotVoter(_))
        ));
        l.approve_revoke(addr(VOTER), id).unwrap();
        assert!(!l.is_valid(&id).unwrap());
        assert!(matches!(
            l.approve_revoke(addr(VOTER), id),
            Err(LedgerError::AlreadyRevoked(_))
        ));
    }

    #[test]
    fn test_governance_disabled() {
        let cfg = LedgerConfig::new("gov-test", addr(ADMIN)).with_capabilities([Capability::Core]);
        let mut l = Ledger::new(cfg).unwrap();
        assert!(matches!(
            l.create_approval_request(addr(1), 1, SlotId::from(1)),
            Err(LedgerError::Unsupported(Capability::Governance))
        ));
    }
}
