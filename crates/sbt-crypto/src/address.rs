//! Address derivation from Ed25519 public keys.

use sbt_core::Address;
use sha2::{Digest, Sha256};

use crate::ed25519::Ed25519PublicKey;

/// Last 20 bytes of SHA-256 over the raw public key.
pub fn address_of(public_key: &Ed25519PublicKey) -> Address {
    let hash = Sha256::digest(public_key.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}
