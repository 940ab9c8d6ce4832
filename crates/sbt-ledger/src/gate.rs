//! # Authorization Gate
//!
//! Every mint and revoke, whichever pathway it arrives through, passes
//! through [`Ledger::authorize`]. The caller names the action and presents an
//! [`AuthProof`]:
//!
//! - `Direct`: the caller's own role (minter for mint, issuer otherwise).
//! - `Governance`: the caller is a voter; a mint names the approval request.
//! - `Delegated`: the caller holds an unconsumed grant for the exact
//!   request or token.
//!
//! Authorization is a pure check producing a [`Ticket`]. The ticket is
//! redeemed (request and grant marked spent) only after the mutation it
//! authorizes has been applied, so a failed call leaves every request and
//! grant untouched.

use sbt_core::{Address, RequestId, SlotId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capability::Capability;
use crate::error::{ErrorKind, LedgerError};
use crate::ledger::Ledger;

/// Lifecycle of an approval or delegate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Open for use.
    Pending,
    /// Used by a mint. Terminal.
    Consumed,
    /// Withdrawn by the creator. Terminal.
    Removed,
}

impl RequestState {
    /// Fail unless the request is still open.
    pub(crate) fn ensure_pending(self, id: RequestId) -> Result<(), LedgerError> {
        match self {
            Self::Pending => Ok(()),
            Self::Consumed => Err(LedgerError::RequestAlreadyConsumed(id)),
            Self::Removed => Err(LedgerError::RequestRemoved(id)),
        }
    }

    /// Fail unless the creator may still remove the request.
    pub(crate) fn ensure_removable(self, id: RequestId) -> Result<(), LedgerError> {
        match self {
            Self::Pending => Ok(()),
            Self::Consumed => Err(LedgerError::AlreadyConsumed(id)),
            Self::Removed => Err(LedgerError::RequestRemoved(id)),
        }
    }
}

/// Identifies a delegation grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantId {
    /// Right to mint from a delegate request.
    Mint(RequestId),
    /// Right to revoke one token.
    Revoke(TokenId),
}

/// Evidence a caller presents for a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProof {
    /// The caller's own role.
    Direct,
    /// A voter's approval. Mints name the approval request; revokes carry none.
    Governance(Option<RequestId>),
    /// A one-time delegation grant.
    Delegated(GrantId),
}

/// A mutation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a token.
    Mint,
    /// Invalidate a token.
    Revoke(TokenId),
    /// Add value.
    Charge(TokenId),
    /// Remove value.
    Consume(TokenId),
    /// Delete the record.
    Destroy(TokenId),
}

impl Action {
    /// Verb used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Revoke(_) => "revoke",
            Self::Charge(_) => "charge",
            Self::Consume(_) => "consume",
            Self::Destroy(_) => "destroy",
        }
    }
}

/// Mint parameters fixed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintTerms {
    /// Recorded as the token's issuer.
    pub issuer: Address,
    /// Designated owner, when the request fixes one.
    pub owner: Option<Address>,
    /// Requested value.
    pub value: u64,
    /// Requested slot.
    pub slot: SlotId,
}

/// A successful authorization, not yet redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticket {
    /// Authorized by the caller's role.
    Direct,
    /// Authorized by a voter's revoke approval.
    Vote,
    /// Authorized by a pending approval request.
    Approval {
        /// The request to consume.
        request: RequestId,
        /// Its terms.
        terms: MintTerms,
    },
    /// Authorized by a mint grant.
    MintGrant {
        /// The delegate request to consume.
        request: RequestId,
        /// The grant holder.
        operator: Address,
        /// The request's terms.
        terms: MintTerms,
    },
    /// Authorized by a revoke grant.
    RevokeGrant {
        /// The covered token.
        token: TokenId,
        /// The grant holder.
        operator: Address,
    },
}

impl Ticket {
    /// The request-fixed mint terms, if the ticket came from a request.
    pub fn mint_terms(&self) -> Option<MintTerms> {
        match self {
            Self::Approval { terms, .. } | Self::MintGrant { terms, .. } => Some(*terms),
            _ => None,
        }
    }
}

impl Ledger {
    /// Decide whether `caller` may perform `action` under `proof`.
    ///
    /// Has no side effects. A mismatched proof and action (for example a
    /// revoke grant presented for a mint) is `Unauthorized`.
    pub fn authorize(
        &self,
        caller: &Address,
        action: &Action,
        proof: &AuthProof,
    ) -> Result<Ticket, LedgerError> {
        let result = self.check_authorization(caller, action, proof);
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Unauthorized {
                warn!(caller = %caller, action = action.name(), proof = ?proof, reason = %err, "authorization rejected");
            }
        }
        result
    }

    fn check_authorization(
        &self,
        caller: &Address,
        action: &Action,
        proof: &AuthProof,
    ) -> Result<Ticket, LedgerError> {
        match proof {
            AuthProof::Direct => {}
            AuthProof::Governance(_) => self.require(Capability::Governance)?,
            AuthProof::Delegated(_) => self.require(Capability::Delegation)?,
        }
        match (action, proof) {
            (Action::Mint, AuthProof::Direct) => {
                if self.config.is_minter(caller) {
                    Ok(Ticket::Direct)
                } else {
                    Err(LedgerError::Unauthorized {
                        caller: *caller,
                        action: action.name(),
                    })
                }
            }
            (
                Action::Revoke(token)
                | Action::Charge(token)
                | Action::Consume(token)
                | Action::Destroy(token),
                AuthProof::Direct,
            ) => {
                let record = self.store.get(token)?;
                if record.issuer != *caller {
                    return Err(LedgerError::Unauthorized {
                        caller: *caller,
                        action: action.name(),
                    });
                }
                if matches!(action, Action::Revoke(_)) && !record.valid {
                    return Err(LedgerError::AlreadyRevoked(*token));
                }
                Ok(Ticket::Direct)
            }
            (Action::Mint, AuthProof::Governance(Some(request))) => {
                self.ensure_voter(caller)?;
                let approval = self.governance.request(request)?;
                approval.state.ensure_pending(*request)?;
                Ok(Ticket::Approval {
                    request: *request,
                    terms: MintTerms {
                        issuer: approval.creator,
                        owner: None,
                        value: approval.value,
                        slot: approval.slot,
                    },
                })
            }
            (Action::Revoke(token), AuthProof::Governance(None)) => {
                self.ensure_voter(caller)?;
                if !self.store.get(token)?.valid {
                    return Err(LedgerError::AlreadyRevoked(*token));
                }
                Ok(Ticket::Vote)
            }
            (Action::Mint, AuthProof::Delegated(GrantId::Mint(request))) => {
                let delegate = self.delegation.request(request)?;
                delegate.state.ensure_pending(*request)?;
                if !self.delegation.holds_mint_grant(request, caller) {
                    return Err(LedgerError::NotDelegated {
                        caller: *caller,
                        target: format!("request {request}"),
                    });
                }
                Ok(Ticket::MintGrant {
                    request: *request,
                    operator: *caller,
                    terms: MintTerms {
                        issuer: delegate.creator,
                        owner: Some(delegate.owner),
                        value: delegate.value,
                        slot: delegate.slot,
                    },
                })
            }
            (Action::Revoke(token), AuthProof::Delegated(GrantId::Revoke(granted)))
                if token == granted =>
            {
                let record = self.store.get(token)?;
                self.delegation.ensure_revoke_grant(token, caller)?;
                if !record.valid {
                    return Err(LedgerError::AlreadyRevoked(*token));
                }
                Ok(Ticket::RevokeGrant {
                    token: *token,
                    operator: *caller,
                })
            }
            _ => Err(LedgerError::Unauthorized {
                caller: *caller,
                action: action.name(),
            }),
        }
    }

    /// Mark the request and grant behind `ticket` as spent.
    pub(crate) fn redeem(&mut self, ticket: &Ticket) {
        match ticket {
            Ticket::Direct | Ticket::Vote => {}
            Ticket::Approval { request, .. } => self.governance.consume(request),
            Ticket::MintGrant {
                request, operator, ..
            } => self.delegation.consume_mint(request, operator),
            Ticket::RevokeGrant { token, operator } => {
                self.delegation.consume_revoke(token, operator)
            }
        }
    }

    pub(crate) fn ensure_voter(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.governance.is_voter(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotVoter(*caller))
        }
    }
}
