//! Expiry dates and the shadow flag.
//!
//! Both are auxiliary per-token state. Expiry does not imply revocation:
//! `is_valid` and `is_expired` answer independently.

use sbt_core::{Address, Timestamp, TokenId};
use tracing::info;

use crate::capability::Capability;
use crate::error::{same_length, LedgerError};
use crate::event::LedgerEvent;
use crate::ledger::Ledger;

impl Ledger {
    // ── Expiry ───────────────────────────────────────────────────────

    /// Set a token's expiry date. Issuer only; `date` must not be in the past.
    pub fn set_expiry_date(
        &mut self,
        caller: Address,
        token: TokenId,
        date: Timestamp,
    ) -> Result<(), LedgerError> {
        self.set_batch_expiry_dates(caller, &[token], &[date])
    }

    /// Set several expiry dates at once. Every entry is validated before any
    /// is written.
    pub fn set_batch_expiry_dates(
        &mut self,
        caller: Address,
        tokens: &[TokenId],
        dates: &[Timestamp],
    ) -> Result<(), LedgerError> {
        self.require(Capability::Expirable)?;
        same_length(tokens, dates)?;
        let now = self.clock.now();
        for (token, date) in tokens.iter().zip(dates) {
            let record = self.store.get(token)?;
            if record.issuer != caller {
                return Err(LedgerError::Unauthorized {
                    caller,
                    action: "set expiry date",
                });
            }
            if *date < now {
                return Err(LedgerError::PastDate { date: *date, now });
            }
        }
        for (token, date) in tokens.iter().zip(dates) {
            self.store.get_mut(token)?.expiry = Some(*date);
            info!(token = %token, date = %date, caller = %caller, "expiry set");
            self.events.push(LedgerEvent::ExpirySet {
                token: *token,
                date: *date,
            });
        }
        Ok(())
    }

    /// The expiry date, if set.
    pub fn expiry_date(&self, token: &TokenId) -> Result<Option<Timestamp>, LedgerError> {
        self.require(Capability::Expirable)?;
        Ok(self.store.get(token)?.expiry)
    }

    /// True iff an expiry date is set and lies in the past.
    pub fn is_expired(&self, token: &TokenId) -> Result<bool, LedgerError> {
        self.require(Capability::Expirable)?;
        Ok(self.store.get(token)?.is_expired(self.clock.now()))
    }

    // ── Visibility ───────────────────────────────────────────────────

    /// Hide a token from viewers other than its owner and issuer.
    pub fn shadow(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.set_shadowed(caller, token, true)
    }

    /// Make a shadowed token visible again.
    pub fn reveal(&mut self, caller: Address, token: TokenId) -> Result<(), LedgerError> {
        self.set_shadowed(caller, token, false)
    }

    /// Whether the token is shadowed.
    pub fn is_shadowed(&self, token: &TokenId) -> Result<bool, LedgerError> {
        self.require(Capability::Shadow)?;
        Ok(self.store.get(token)?.shadowed)
    }

    fn set_shadowed(
        &mut self,
        caller: Address,
        token: TokenId,
        shadowed: bool,
    ) -> Result<(), LedgerError> {
        self.require(Capability::Shadow)?;
        let record = self.store.get_mut(&token)?;
        if record.owner != caller && record.issuer != caller {
            return Err(LedgerError::Unauthorized {
                caller,
                action: if shadowed { "shadow" } else { "reveal" },
            });
        }
        if record.shadowed == shadowed {
            return Ok(());
        }
        record.shadowed = shadowed;
        info!(token = %token, caller = %caller, shadowed, "visibility changed");
        self.events.push(if shadowed {
            LedgerEvent::Shadowed { token }
        } else {
            LedgerEvent::Revealed { token }
        });
        Ok(())
    }
}
