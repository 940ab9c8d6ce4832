//! # sbt-core — Foundational Types for the Token Ledger
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! shares and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `TokenId`, `SlotId` and
//!    `RequestId` are distinct 256-bit types; `Address` is a 20-byte identity
//!    handle. You cannot pass a slot where a token is expected.
//!
//! 2. **`CanonicalBytes` newtype.** Every signed or digested message flows
//!    through `CanonicalBytes::new()` (RFC 8785 JCS). Recovery signatures are
//!    computed over these bytes and nothing else.
//!
//! 3. **Epoch-second timestamps.** `Timestamp` is an unsigned count of seconds
//!    since the Unix epoch. Time is read through the `Clock` trait so expiry
//!    checks can be driven deterministically.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sbt-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError, CryptoError};
pub use identity::{Address, RequestId, SlotId, TokenId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
