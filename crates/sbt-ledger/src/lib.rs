//! # sbt-ledger — Non-Transferable Token Ledger
//!
//! Tracks identity-bound credential tokens (owner, issuer, value, slot,
//! validity, expiry, visibility) and arbitrates who may create, adjust,
//! invalidate or rebind them.
//!
//! ## Architecture
//!
//! - **Ledger Store** (`store`): token table plus global, per-owner and
//!   per-slot indices, kept exactly consistent by every mutator.
//! - **Authorization Gate** (`gate`): one check for all three pathways,
//!   selected by an [`AuthProof`]. Requests and grants are spent only after
//!   the authorized mutation succeeds.
//! - **Governance** (`governance`): administrator-managed voters approving
//!   single mints and revokes.
//! - **Delegation** (`delegation`): one-time mint and revoke grants.
//! - **Recovery** (`recovery`): signature-authenticated rebinding of every
//!   token of an address.
//! - **Expiry & Visibility** (`expiry`, `view`): per-token expiry dates and
//!   the shadow flag, enforced on viewer-scoped queries.
//!
//! Tokens never move between addresses except through [`Ledger::recover`].
//!
//! ## Transactions
//!
//! Every public `Ledger` method validates all preconditions before writing.
//! An `Err` means no state changed, batches included. [`SharedLedger`]
//! serializes calls from multiple threads.

pub mod capability;
pub mod config;
pub mod delegation;
pub mod error;
pub mod event;
pub mod expiry;
pub mod gate;
pub mod governance;
pub mod ledger;
pub mod metadata;
pub mod recovery;
pub mod shared;
pub mod store;
pub mod token;
pub mod view;

pub use capability::Capability;
pub use config::{LedgerConfig, MetadataConfig};
pub use delegation::{DelegateRequest, DelegationState, GrantState};
pub use error::{ErrorKind, LedgerError};
pub use event::LedgerEvent;
pub use gate::{Action, AuthProof, GrantId, MintTerms, RequestState, Ticket};
pub use governance::{ApprovalRequest, GovernanceState};
pub use ledger::{Ledger, LedgerSnapshot};
pub use metadata::{MetadataResolver, TemplateResolver};
pub use recovery::{RecoveryMessage, RecoveryState};
pub use shared::SharedLedger;
pub use store::LedgerStore;
pub use token::Token;
pub use view::LedgerView;
