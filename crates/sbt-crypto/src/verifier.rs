//! # Recovery Signature Verification
//!
//! The ledger treats signatures as opaque bytes and hands them to a
//! [`SignatureVerifier`]. The Ed25519 implementation expects a
//! [`RecoveryProof`] encoding: the 32-byte public key followed by the
//! 64-byte signature. Ed25519 has no public-key recovery, so the key travels
//! with the signature and is bound to the claimed address by derivation.

use sbt_core::{hex, Address, CanonicalBytes, CryptoError};
use serde::{Deserialize, Serialize};

use crate::ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Checks that `signature` proves control of `signer` over `message`.
pub trait SignatureVerifier: Send + Sync + std::fmt::Debug {
    /// Verify the proof, returning the reason on failure.
    fn verify(
        &self,
        signer: &Address,
        message: &CanonicalBytes,
        signature: &[u8],
    ) -> Result<(), CryptoError>;
}

/// Public key plus signature, as submitted to `recover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryProof {
    /// Key whose derived address must equal the recovered owner.
    pub public_key: Ed25519PublicKey,
    /// Signature over the canonical recovery message.
    pub signature: Ed25519Signature,
}

impl RecoveryProof {
    /// Encoded length in bytes.
    pub const LEN: usize = 96;

    /// Sign `message` with `keypair`.
    pub fn sign(keypair: &Ed25519KeyPair, message: &CanonicalBytes) -> Self {
        Self {
            public_key: keypair.public_key(),
            signature: keypair.sign(message),
        }
    }

    /// `public_key || signature`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(self.public_key.as_bytes());
        out.extend_from_slice(self.signature.as_bytes());
        out
    }

    /// Decode from `public_key || signature`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::InvalidLength {
                what: "recovery proof",
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        let mut pk = [0u8; 32];
        pk.copy_from_slice(&bytes[..32]);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&bytes[32..]);
        Ok(Self {
            public_key: Ed25519PublicKey::from_bytes(pk),
            signature: Ed25519Signature::from_bytes(sig),
        })
    }

    /// Hex of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(&self.to_bytes())
    }

    /// Decode from hex.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(input.trim().trim_start_matches("0x"))
            .map_err(CryptoError::VerificationFailed)?;
        Self::from_bytes(&bytes)
    }
}

/// Verifies [`RecoveryProof`]-encoded Ed25519 signatures.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519RecoveryVerifier;

impl SignatureVerifier for Ed25519RecoveryVerifier {
    fn verify(
        &self,
        signer: &Address,
        message: &CanonicalBytes,
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let proof = RecoveryProof::from_bytes(signature)?;
        let derived = proof.public_key.address();
        if derived != *signer {
            return Err(CryptoError::AddressMismatch {
                claimed: signer.to_hex(),
                derived: derived.to_hex(),
            });
        }
        verify(message, &proof.signature, &proof.public_key)
    }
}
