//! # Ledger Error Types
//!
//! Every failure a ledger call can produce. Each variant carries the ids,
//! caller, or amounts needed to diagnose it without reading logs.
//!
//! Every error aborts the whole call: the ledger validates all
//! preconditions before writing, so an `Err` always means no state changed.
//! [`LedgerError::kind`] folds the variants into the coarse taxonomy callers
//! branch on.

use sbt_core::{Address, CanonicalizationError, RequestId, SlotId, Timestamp, TokenId};
use thiserror::Error;

use crate::capability::Capability;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An id did not resolve to a record.
    NotFound,
    /// The caller lacks the role or grant the operation needs.
    Unauthorized,
    /// The record's lifecycle state forbids the operation.
    InvalidState,
    /// An enumeration index was past the end.
    IndexOutOfRange,
    /// Batch arrays had different lengths.
    LengthMismatch,
    /// A recovery proof failed verification or was replayed.
    InvalidSignature,
    /// An invalid change to the voter set.
    Membership,
    /// The operation group is not enabled on this ledger.
    Unsupported,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::InvalidState => "invalid_state",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::LengthMismatch => "length_mismatch",
            Self::InvalidSignature => "invalid_signature",
            Self::Membership => "membership",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No token with this id.
    #[error("token {0} not found")]
    TokenNotFound(TokenId),

    /// No approval or delegate request with this id.
    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    /// No extant token references this slot.
    #[error("slot {0} not found")]
    SlotNotFound(SlotId),

    /// The caller may not perform this action.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
        /// The attempted action.
        action: &'static str,
    },

    /// Voter management requires the administrator.
    #[error("{0} is not the administrator")]
    NotAdministrator(Address),

    /// Governance approval requires a current voter.
    #[error("{0} is not a voter")]
    NotVoter(Address),

    /// Only a request's creator may remove it.
    #[error("{caller} did not create request {request}")]
    NotCreator {
        /// The rejected caller.
        caller: Address,
        /// The request.
        request: RequestId,
    },

    /// The caller holds no delegation grant for this target.
    #[error("{caller} holds no delegation for {target}")]
    NotDelegated {
        /// The rejected caller.
        caller: Address,
        /// The request or token the grant would cover.
        target: String,
    },

    /// The token is already revoked.
    #[error("token {0} is already revoked")]
    AlreadyRevoked(TokenId),

    /// The token is revoked and no longer accepts this mutation.
    #[error("token {token} is revoked and cannot {action}")]
    TokenRevoked {
        /// The token.
        token: TokenId,
        /// The refused action.
        action: &'static str,
    },

    /// The request has already been used to mint.
    #[error("request {0} has already been consumed")]
    RequestAlreadyConsumed(RequestId),

    /// A consumed request cannot be removed.
    #[error("request {0} is consumed and cannot be removed")]
    AlreadyConsumed(RequestId),

    /// The request was withdrawn by its creator.
    #[error("request {0} has been removed")]
    RequestRemoved(RequestId),

    /// A revoke grant has already been used.
    #[error("revoke grant for token {token} held by {operator} has already been used")]
    GrantConsumed {
        /// The grant holder.
        operator: Address,
        /// The token the grant covered.
        token: TokenId,
    },

    /// Value must be strictly positive.
    #[error("value must be greater than zero")]
    ZeroValue,

    /// Consume exceeds the token's current value.
    #[error("cannot consume {requested} from token {token}: only {available} available")]
    InsufficientValue {
        /// The token.
        token: TokenId,
        /// Amount requested.
        requested: u64,
        /// Current value.
        available: u64,
    },

    /// Charge would overflow the token's value.
    #[error("charging {added} to token {token} overflows its value {current}")]
    ValueOverflow {
        /// The token.
        token: TokenId,
        /// Current value.
        current: u64,
        /// Amount added.
        added: u64,
    },

    /// Expiry dates must not lie in the past.
    #[error("expiry date {date} is before the current time {now}")]
    PastDate {
        /// The rejected date.
        date: Timestamp,
        /// The ledger's current time.
        now: Timestamp,
    },

    /// Slot zero is the "unset" sentinel and cannot be assigned.
    #[error("slot 0 is reserved as the unset sentinel")]
    UnsetSlot,

    /// The zero address cannot hold this role.
    #[error("the zero address is not a valid {0}")]
    ZeroAddress(&'static str),

    /// The explicit token id is already in use.
    #[error("token {0} already exists")]
    DuplicateToken(TokenId),

    /// No sequential token ids remain.
    #[error("token id space exhausted")]
    IdSpaceExhausted,

    /// Enumeration index past the end.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of entries.
        len: usize,
    },

    /// Batch arrays differ in length.
    #[error("batch length mismatch: {left} != {right}")]
    LengthMismatch {
        /// Length of the first array.
        left: usize,
        /// Length of the second array.
        right: usize,
    },

    /// The address holds no tokens.
    #[error("{0} holds no tokens")]
    NoTokens(Address),

    /// The recovery proof was rejected.
    #[error("invalid recovery signature: {0}")]
    InvalidSignature(String),

    /// Recovering an address onto itself.
    #[error("{0} cannot recover its own tokens onto itself")]
    RecoveryToSelf(Address),

    /// The address is already a voter.
    #[error("{0} is already a voter")]
    DuplicateVoter(Address),

    /// The address is not a voter.
    #[error("{0} is not a registered voter")]
    UnknownVoter(Address),

    /// The operation group is disabled on this ledger.
    #[error("capability {0} is not supported by this ledger")]
    Unsupported(Capability),

    /// The viewer may not see this token.
    #[error("token {0} is shadowed")]
    TokenShadowed(TokenId),

    /// The configuration or snapshot failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An index disagrees with the primary token table.
    #[error("index inconsistency: {0}")]
    IndexCorrupted(String),

    /// Building the canonical recovery message failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl LedgerError {
    /// The taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TokenNotFound(_) | Self::RequestNotFound(_) | Self::SlotNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Unauthorized { .. }
            | Self::NotAdministrator(_)
            | Self::NotVoter(_)
            | Self::NotCreator { .. }
            | Self::NotDelegated { .. }
            | Self::TokenShadowed(_) => ErrorKind::Unauthorized,
            Self::AlreadyRevoked(_)
            | Self::TokenRevoked { .. }
            | Self::RequestAlreadyConsumed(_)
            | Self::AlreadyConsumed(_)
            | Self::RequestRemoved(_)
            | Self::GrantConsumed { .. }
            | Self::ZeroValue
            | Self::InsufficientValue { .. }
            | Self::ValueOverflow { .. }
            | Self::PastDate { .. }
            | Self::UnsetSlot
            | Self::ZeroAddress(_)
            | Self::DuplicateToken(_)
            | Self::IdSpaceExhausted
            | Self::NoTokens(_)
            | Self::RecoveryToSelf(_)
            | Self::InvalidConfig(_)
            | Self::IndexCorrupted(_)
            | Self::Canonicalization(_) => ErrorKind::InvalidState,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            Self::InvalidSignature(_) => ErrorKind::InvalidSignature,
            Self::DuplicateVoter(_) | Self::UnknownVoter(_) => ErrorKind::Membership,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}

/// Look up `index` in `items`, or fail with `IndexOutOfRange`.
pub(crate) fn at<T: Copy>(items: &[T], index: usize) -> Result<T, LedgerError> {
    items
        .get(index)
        .copied()
        .ok_or(LedgerError::IndexOutOfRange {
            index,
            len: items.len(),
        })
}

/// Fail with `LengthMismatch` unless both batches have the same length.
pub(crate) fn same_length<A, B>(left: &[A], right: &[B]) -> Result<(), LedgerError> {
    if left.len() != right.len() {
        return Err(LedgerError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_value_display() {
        let err = LedgerError::InsufficientValue {
            token: TokenId::from(1),
            requested: 200,
            available: 150,
        };
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("150"));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_kind_taxonomy() {
        let addr = Address::from_bytes([1; 20]);
        assert_eq!(LedgerError::TokenNotFound(TokenId::from(9)).kind(), ErrorKind::NotFound);
        assert_eq!(LedgerError::NotVoter(addr).kind(), ErrorKind::Unauthorized);
        assert_eq!(LedgerError::DuplicateVoter(addr).kind(), ErrorKind::Membership);
        assert_eq!(
            LedgerError::IndexOutOfRange { index: 3, len: 2 }.kind(),
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            LedgerError::LengthMismatch { left: 1, right: 2 }.kind(),
            ErrorKind::LengthMismatch
        );
        assert_eq!(
            LedgerError::InvalidSignature("replayed".into()).kind(),
            ErrorKind::InvalidSignature
        );
        assert_eq!(
            LedgerError::Unsupported(Capability::Recovery).kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_at_and_same_length() {
        let items = [10, 20];
        assert_eq!(at(&items, 1).unwrap(), 20);
        assert!(matches!(
            at(&items, 2),
            Err(LedgerError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(same_length(&[1, 2], &["a", "b"]).is_ok());
        assert!(matches!(
            same_length(&[1], &["a", "b"]),
            Err(LedgerError::LengthMismatch { left: 1, right: 2 })
        ));
    }
}
