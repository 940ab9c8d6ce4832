//! # Identifier Newtypes
//!
//! Token, slot and request identifiers are 256-bit unsigned integers stored
//! big-endian, so the derived byte-wise ordering is the numeric ordering.
//! Addresses are 20-byte opaque identity handles.
//!
//! ## Security Invariant
//!
//! Each namespace is its own type. A `SlotId` cannot be passed where a
//! `TokenId` is expected, which rules out cross-namespace confusion in the
//! authorization paths (a revoke grant is bound to a token, a mint grant to
//! a request).
//!
//! ## Text form
//!
//! Identifiers display in decimal and parse from decimal or `0x`-prefixed hex.
//! They serialize as decimal strings and deserialize from either a string or
//! a JSON/YAML integer. Addresses display and serialize as `0x` + 40 hex chars.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::hex;

// ─── 256-bit arithmetic helpers ──────────────────────────────────────

/// `bytes = bytes * 10 + digit`; returns false on overflow.
fn mul10_add(bytes: &mut [u8; 32], digit: u8) -> bool {
    let mut carry = u16::from(digit);
    for b in bytes.iter_mut().rev() {
        let v = u16::from(*b) * 10 + carry;
        *b = (v & 0xff) as u8;
        carry = v >> 8;
    }
    carry == 0
}

/// `bytes = bytes / 10`, returning the remainder.
fn divmod10(bytes: &mut [u8; 32]) -> u8 {
    let mut rem = 0u16;
    for b in bytes.iter_mut() {
        let cur = rem * 256 + u16::from(*b);
        *b = (cur / 10) as u8;
        rem = cur % 10;
    }
    rem as u8
}

fn is_zero(bytes: &[u8; 32]) -> bool {
    bytes.iter().all(|b| *b == 0)
}

fn to_decimal(bytes: &[u8; 32]) -> String {
    if is_zero(bytes) {
        return "0".to_string();
    }
    let mut n = *bytes;
    let mut digits = Vec::new();
    while !is_zero(&n) {
        digits.push(b'0' + divmod10(&mut n));
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

fn parse_u256(input: &str) -> Result<[u8; 32], CoreError> {
    let invalid = |reason: &str| CoreError::InvalidIdentifier {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let s = input.trim();
    if let Some(hex_digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_digits.is_empty() || hex_digits.len() > 64 {
            return Err(invalid("hex form must have 1 to 64 digits"));
        }
        let padded = format!("{hex_digits:0>64}");
        return hex::decode_array::<32>(&padded.to_lowercase()).map_err(|e| invalid(&e));
    }
    if s.is_empty() {
        return Err(invalid("empty identifier"));
    }
    let mut bytes = [0u8; 32];
    for c in s.chars() {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| invalid("expected decimal digits or 0x-prefixed hex"))?;
        if !mul10_add(&mut bytes, digit as u8) {
            return Err(invalid("value exceeds 256 bits"));
        }
    }
    Ok(bytes)
}

struct U256Visitor(&'static str);

impl<'de> Visitor<'de> for U256Visitor {
    type Value = [u8; 32];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {} as an unsigned integer or decimal/hex string", self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Ok(bytes)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(format!("{} must be non-negative, got {v}", self.0)))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_u256(v).map_err(E::custom)
    }
}

// ─── 256-bit identifiers ─────────────────────────────────────────────

macro_rules! u256_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; 32]);

        impl $name {
            /// The zero value.
            pub const ZERO: Self = Self([0u8; 32]);

            /// Construct from a big-endian 32-byte value.
            pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Construct from a `u64`.
            pub fn from_u64(n: u64) -> Self {
                let mut bytes = [0u8; 32];
                bytes[24..].copy_from_slice(&n.to_be_bytes());
                Self(bytes)
            }

            /// The big-endian 32-byte value.
            pub fn as_be_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// The value as a `u64`, if it fits.
            pub fn to_u64(&self) -> Option<u64> {
                if self.0[..24].iter().any(|b| *b != 0) {
                    return None;
                }
                let mut tail = [0u8; 8];
                tail.copy_from_slice(&self.0[24..]);
                Some(u64::from_be_bytes(tail))
            }

            /// Whether this is the zero value.
            pub fn is_zero(&self) -> bool {
                is_zero(&self.0)
            }

            /// The next value, or `None` at 2^256 - 1.
            pub fn checked_next(&self) -> Option<Self> {
                let mut bytes = self.0;
                for b in bytes.iter_mut().rev() {
                    let (v, overflow) = b.overflowing_add(1);
                    *b = v;
                    if !overflow {
                        return Some(Self(bytes));
                    }
                }
                None
            }

            /// Render as `0x`-prefixed, zero-padded hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(&self.0))
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self::from_u64(n)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_u256(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&to_decimal(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), to_decimal(&self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&to_decimal(&self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(U256Visitor($label)).map(Self)
            }
        }
    };
}

u256_id!(
    /// Unique identifier of a token record.
    TokenId,
    "token id"
);

u256_id!(
    /// Identifier of a slot (grouping category). Zero means "unset" and is
    /// never the slot of an extant token.
    SlotId,
    "slot id"
);

u256_id!(
    /// Identifier of a governance approval request or a delegate request.
    RequestId,
    "request id"
);

// ─── Address ─────────────────────────────────────────────────────────

/// A 20-byte identity handle.
///
/// The ledger never interprets addresses beyond equality; deriving an
/// address from key material is the job of `sbt-crypto`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw 20-byte value.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Render as `0x` + 40 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Parse from 40 hex chars, with or without a `0x` prefix.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let s = input.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(CoreError::InvalidAddress {
                input: input.to_string(),
                reason: format!("expected 40 hex chars, got {}", digits.len()),
            });
        }
        hex::decode_array::<20>(&digits.to_lowercase())
            .map(Self)
            .map_err(|reason| CoreError::InvalidAddress {
                input: input.to_string(),
                reason,
            })
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}...)", hex::prefix(&self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
