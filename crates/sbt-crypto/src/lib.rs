//! # sbt-crypto — Cryptographic Primitives for the Token Ledger
//!
//! - **Ed25519** key pairs, signing over [`CanonicalBytes`](sbt_core::CanonicalBytes),
//!   and verification.
//! - **Address derivation**: an address is the last 20 bytes of
//!   SHA-256 over the 32-byte Ed25519 public key.
//! - **Recovery verification**: the [`SignatureVerifier`] trait is the
//!   ledger's cryptographic collaborator; [`Ed25519RecoveryVerifier`] checks
//!   a [`RecoveryProof`] (public key plus signature) against the claimed owner.

pub mod address;
pub mod ed25519;
pub mod verifier;

// Re-export primary types.
pub use address::address_of;
pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use verifier::{Ed25519RecoveryVerifier, RecoveryProof, SignatureVerifier};
