//! # Error Types
//!
//! Errors shared by the foundational crates. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! Ledger-level failures (authorization, lifecycle state, enumeration
//! bounds) live in `sbt-ledger`; this module only covers parsing,
//! canonicalization and cryptography.

use thiserror::Error;

/// Error raised while parsing or constructing a core primitive.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A 256-bit identifier could not be parsed.
    #[error("invalid identifier {input:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An address could not be parsed.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp was malformed or out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// An encoded key, signature or proof had the wrong length.
    #[error("invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// What was being decoded.
        what: &'static str,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// The signing key does not control the claimed address.
    #[error("key for {derived} does not control address {claimed}")]
    AddressMismatch {
        /// Address the proof claims to speak for.
        claimed: String,
        /// Address derived from the presented key.
        derived: String,
    },

    /// Message canonicalization failed before signing or verification.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
