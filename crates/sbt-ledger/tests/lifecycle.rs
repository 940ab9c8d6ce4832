//! # Token Lifecycle
//!
//! End-to-end lifecycle checks through the public `Ledger` API: the
//! mint/charge/consume/revoke scenario, owner index round-trips, and
//! all-or-nothing behavior of failing calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use sbt_core::{Address, ManualClock, SlotId, Timestamp, TokenId};
use sbt_ledger::{Ledger, LedgerConfig, LedgerError, LedgerEvent};

const ISSUER: Address = Address::from_bytes([0xaa; 20]);
const OWNER_A: Address = Address::from_bytes([0x01; 20]);
const OWNER_B: Address = Address::from_bytes([0x02; 20]);

fn ledger() -> Ledger {
    Ledger::new(LedgerConfig::new("lifecycle.test", ISSUER)).expect("valid config")
}

// =========================================================================
// Reference scenario
// =========================================================================

#[test]
fn mint_charge_consume_revoke_scenario() {
    let mut l = ledger();

    let id = l.mint(ISSUER, OWNER_A, 100, SlotId::from(1)).unwrap();
    assert_eq!(id, TokenId::from(1));

    l.charge(ISSUER, id, 50).unwrap();
    assert_eq!(l.value_of(&id).unwrap(), 150);

    let err = l.consume(ISSUER, id, 200).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientValue { .. }));
    assert_eq!(l.value_of(&id).unwrap(), 150);

    l.consume(ISSUER, id, 150).unwrap();
    assert_eq!(l.value_of(&id).unwrap(), 0);

    l.revoke(ISSUER, id).unwrap();
    assert!(!l.is_valid(&id).unwrap());

    let kinds: Vec<&str> = l
        .events()
        .iter()
        .map(|e| match e {
            LedgerEvent::Minted { .. } => "minted",
            LedgerEvent::SlotChanged { .. } => "slot_changed",
            LedgerEvent::Charged { .. } => "charged",
            LedgerEvent::Consumed { .. } => "consumed",
            LedgerEvent::Revoked { .. } => "revoked",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        ["minted", "slot_changed", "charged", "consumed", "revoked"]
    );
}

#[test]
fn revocation_is_permanent() {
    let mut l = ledger();
    let id = l.mint(ISSUER, OWNER_A, 10, SlotId::from(1)).unwrap();
    l.revoke(ISSUER, id).unwrap();
    assert!(matches!(
        l.revoke(ISSUER, id),
        Err(LedgerError::AlreadyRevoked(_))
    ));
    assert!(l.set_slot(OWNER_A, id, SlotId::from(2)).is_err());
    assert!(!l.is_valid(&id).unwrap());
    // historical data remains
    assert_eq!(l.value_of(&id).unwrap(), 10);
    assert_eq!(l.issuer_of(&id).unwrap(), ISSUER);
}

// =========================================================================
// Owner index
// =========================================================================

#[test]
fn owner_index_round_trip() {
    let mut l = ledger();
    for i in 0..6u64 {
        let owner = if i % 2 == 0 { OWNER_A } else { OWNER_B };
        l.mint(ISSUER, owner, i + 1, SlotId::from(i % 3 + 1)).unwrap();
    }
    l.destroy(ISSUER, TokenId::from(3)).unwrap();

    for owner in [OWNER_A, OWNER_B] {
        let n = l.balance_of(&owner).unwrap();
        let enumerated: BTreeSet<TokenId> = (0..n)
            .map(|i| l.token_of_owner_by_index(&owner, i).unwrap())
            .collect();
        let expected: BTreeSet<TokenId> = (0..l.total_supply().unwrap())
            .map(|i| l.token_by_index(i).unwrap())
            .filter(|id| l.owner_of(id).unwrap() == owner)
            .collect();
        assert_eq!(enumerated, expected);
        assert!(matches!(
            l.token_of_owner_by_index(&owner, n),
            Err(LedgerError::IndexOutOfRange { .. })
        ));
    }
    l.check_consistency().unwrap();
}

#[test]
fn balance_of_unknown_owner_is_an_error() {
    let l = ledger();
    assert!(matches!(
        l.balance_of(&OWNER_A),
        Err(LedgerError::NoTokens(_))
    ));
    assert_eq!(l.token_count_of(&OWNER_A), 0);
}

// =========================================================================
// Atomicity
// =========================================================================

#[test]
fn failing_calls_leave_state_untouched() {
    let clock = ManualClock::new(Timestamp::from_epoch_secs(1_000));
    let mut l = ledger().with_clock(Arc::new(clock));
    let id = l.mint(ISSUER, OWNER_A, 10, SlotId::from(1)).unwrap();
    let before = l.snapshot();

    assert!(l.mint(OWNER_A, OWNER_A, 1, SlotId::from(1)).is_err());
    assert!(l.charge(OWNER_A, id, 1).is_err());
    assert!(l.consume(ISSUER, id, 11).is_err());
    assert!(l.destroy(OWNER_B, id).is_err());
    assert!(l.set_slot(OWNER_B, id, SlotId::from(9)).is_err());
    assert!(l
        .set_expiry_date(ISSUER, id, Timestamp::from_epoch_secs(999))
        .is_err());
    assert!(l.mint_with_id(ISSUER, id, OWNER_B, 1, SlotId::from(1)).is_err());

    assert_eq!(l.snapshot(), before);
}

#[test]
fn batch_expiry_is_all_or_nothing() {
    let clock = ManualClock::new(Timestamp::from_epoch_secs(10_000));
    let mut l = ledger().with_clock(Arc::new(clock));
    let t1 = l.mint(ISSUER, OWNER_A, 1, SlotId::from(1)).unwrap();
    let t2 = l.mint(ISSUER, OWNER_A, 1, SlotId::from(1)).unwrap();
    let d1 = Timestamp::from_epoch_secs(20_000);
    let d2 = Timestamp::from_epoch_secs(5_000);

    let before = l.snapshot();
    assert!(matches!(
        l.set_batch_expiry_dates(ISSUER, &[t1, t2], &[d1, d2]),
        Err(LedgerError::PastDate { .. })
    ));
    assert_eq!(l.expiry_date(&t1).unwrap(), None);
    assert_eq!(l.snapshot(), before);
}

#[test]
fn expiry_is_independent_of_validity() {
    let clock = ManualClock::new(Timestamp::from_epoch_secs(100));
    let mut l = ledger().with_clock(Arc::new(clock.clone()));
    let id = l.mint(ISSUER, OWNER_A, 1, SlotId::from(1)).unwrap();
    l.set_expiry_date(ISSUER, id, Timestamp::from_epoch_secs(150))
        .unwrap();
    clock.set(Timestamp::from_epoch_secs(200));
    assert!(l.is_expired(&id).unwrap());
    assert!(l.is_valid(&id).unwrap());
    l.revoke(ISSUER, id).unwrap();
    assert!(l.is_expired(&id).unwrap());
    assert!(!l.is_valid(&id).unwrap());
}
