//! # Temporal Types — Epoch-Second Timestamps and Clocks
//!
//! `Timestamp` is an unsigned count of seconds since the Unix epoch, which
//! is the boundary representation for expiry dates. It renders as ISO8601
//! with a `Z` suffix for humans and logs.
//!
//! Time is never read from ambient globals inside the ledger. The ledger
//! owns a `Clock`; production uses [`SystemClock`], tests drive a shared
//! [`ManualClock`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Seconds since the Unix epoch (UTC).
///
/// Serializes as a bare unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself.
    pub const EPOCH: Self = Self(0);

    /// Current UTC time, truncated to seconds.
    ///
    /// Instants before the epoch clamp to zero.
    pub fn now() -> Self {
        Self(u64::try_from(Utc::now().timestamp()).unwrap_or(0))
    }

    /// Create a timestamp from epoch seconds.
    pub const fn from_epoch_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Epoch seconds.
    pub const fn epoch_secs(&self) -> u64 {
        self.0
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    ///
    /// # Errors
    ///
    /// Rejects instants before the Unix epoch.
    pub fn from_utc(dt: DateTime<Utc>) -> Result<Self, CoreError> {
        u64::try_from(dt.timestamp())
            .map(Self)
            .map_err(|_| CoreError::InvalidTimestamp(format!("{dt} is before the Unix epoch")))
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// Explicit offsets (including `+00:00`) are rejected so that every
    /// accepted string has a single spelling.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            CoreError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Self::from_utc(dt.with_timezone(&Utc))
    }

    /// This timestamp plus `secs`, saturating at the maximum.
    pub fn saturating_add(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// This timestamp minus `secs`, saturating at the epoch.
    pub fn saturating_sub(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    ///
    /// Values beyond chrono's range fall back to the raw epoch seconds.
    pub fn to_iso8601(&self) -> String {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| format!("@{}", self.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

// ─── Clocks ──────────────────────────────────────────────────────────

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and hand another to the ledger.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock fixed at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(at.epoch_secs())),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.epoch_secs(), Ordering::SeqCst);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.secs.load(Ordering::SeqCst))
    }
}
