//! # Shared Ledger Handle
//!
//! Thread-safe, cloneable handle to one ledger. Queries take a read lock and
//! may run concurrently; every mutation runs under the write lock, so calls
//! are applied one at a time with no interleaved partial effects.
//!
//! The lock is `parking_lot::RwLock`: synchronous, never held across await
//! points, and not poisoned by a panicking writer.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerSnapshot};

/// Cloneable handle serializing access to a [`Ledger`].
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    /// Wrap a ledger.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Run a query under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run one mutation under the write lock.
    pub fn transact<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Run several mutations as one unit under the write lock. If the
    /// closure fails, the ledger is restored to its state before the call.
    pub fn transact_all<R>(
        &self,
        f: impl FnOnce(&mut Ledger) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let mut guard = self.inner.write();
        let checkpoint = (*guard).clone();
        match f(&mut *guard) {
            Ok(r) => Ok(r),
            Err(e) => {
                *guard = checkpoint;
                Err(e)
            }
        }
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use sbt_core::{Address, SlotId, TokenId};

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn shared() -> SharedLedger {
        SharedLedger::new(Ledger::new(LedgerConfig::new("shared-test", addr(0xaa))).unwrap())
    }

    #[test]
    fn test_clones_share_state() {
        let a = shared();
        let b = a.clone();
        a.transact(|l| l.mint(addr(0xaa), addr(1), 5, SlotId::from(1)))
            .unwrap();
        assert_eq!(b.read(|l| l.token_count_of(&addr(1))), 1);
    }

    #[test]
    fn test_transact_all_rolls_back() {
        let s = shared();
        let before = s.snapshot();
        let result = s.transact_all(|l| {
            l.mint(addr(0xaa), addr(1), 5, SlotId::from(1))?;
            l.consume(addr(0xaa), TokenId::from(1), 10)
        });
        assert!(matches!(result, Err(LedgerError::InsufficientValue { .. })));
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_concurrent_mints_are_serialized() {
        let s = shared();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = s.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        s.transact(|l| l.mint(addr(0xaa), addr(1), 1, SlotId::from(1)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        s.read(|l| {
            assert_eq!(l.token_count_of(&addr(1)), 200);
            l.check_consistency().unwrap();
        });
    }
}
