//! Accrual and eviction-boundary checks against the processor directly.
//!
//! Both boundary policies are covered: `Inclusive` evicts at the horizon
//! block, `Strict` one block later.

use rent_core::ledger::{Account, RentRecord};
use rent_core::params::RentParams;
use rent_core::types::{Address, EvictBlock, EvictionBoundary};
use rent_node_lib::processor::RentProcessor;
use rent_node_lib::{TxContext, WorldState};
use rent_tests::helpers::*;

fn bare_params(boundary: EvictionBoundary) -> RentParams {
    RentParams {
        upgrade_block: 1,
        eviction_boundary: boundary,
        ..RentParams::default()
    }
}

/// A one-unit account holding `rent_balance`, last paid at `last_paid`.
fn seeded(p: &RentProcessor, rent_balance: u64, last_paid: u64) -> (WorldState, Address) {
    let address = addr(1);
    let mut state = WorldState::new();
    let mut account = Account::with_rent(RentRecord::derive(p.calculator(), rent_balance, last_paid, 0, 0));
    account.balance = 1;
    state.put_account(address, account);
    (state, address)
}

#[test]
fn accrual_example() {
    let p = processor(bare_params(EvictionBoundary::Inclusive));
    let (mut state, a) = seeded(&p, 1_000_000, 100);

    p.on_value_transfer(&mut state, a, 1, 150);
    let rent = state.account(&a).unwrap().rent().clone();
    assert_eq!(rent.rent_balance(), 800_000);
    assert_eq!(rent.rent_last_paid(), 150);
    assert_eq!(rent.rent_evict_block(), EvictBlock::At(350));
    assert_eq!(state.scheduler().evict_block(&a), EvictBlock::At(350));
}

#[test]
fn clamp_at_zero() {
    let p = processor(bare_params(EvictionBoundary::Inclusive));
    let (mut state, a) = seeded(&p, 1_000, 100);

    p.on_value_transfer(&mut state, a, 1, 101);
    let rent = state.account(&a).unwrap().rent().clone();
    assert_eq!(rent.rent_balance(), 0);
    assert_eq!(rent.rent_evict_block(), EvictBlock::At(101));
}

/// Touch the account at `block` and report whether it was evicted.
fn touch_evicts(boundary: EvictionBoundary, block: u64) -> bool {
    let p = processor(bare_params(boundary));
    let (mut state, a) = seeded(&p, 800_000, 150);
    let mut ctx = TxContext::new(&p, &mut state, block);
    ctx.touch(a);
    let report = ctx.finalize();
    let evicted = report.evicted == vec![a];
    assert_eq!(evicted, !state.contains(&a));
    evicted
}

#[test]
fn inclusive_boundary() {
    assert!(!touch_evicts(EvictionBoundary::Inclusive, 349));
    assert!(touch_evicts(EvictionBoundary::Inclusive, 350));
    assert!(touch_evicts(EvictionBoundary::Inclusive, 351));
}

#[test]
fn strict_boundary() {
    assert!(!touch_evicts(EvictionBoundary::Strict, 349));
    assert!(!touch_evicts(EvictionBoundary::Strict, 350));
    assert!(touch_evicts(EvictionBoundary::Strict, 351));
}

#[test]
fn due_by_agrees_with_is_evictable() {
    for boundary in [EvictionBoundary::Inclusive, EvictionBoundary::Strict] {
        let p = processor(bare_params(boundary));
        let (state, a) = seeded(&p, 800_000, 150);
        for block in 340..360 {
            let due = p.due_by(&state, block).contains(&a);
            assert_eq!(
                due,
                p.is_evictable(&state, &a, block),
                "{boundary:?} at block {block}"
            );
        }
    }
}

#[test]
fn due_by_never_removes() {
    let p = processor(bare_params(EvictionBoundary::Inclusive));
    let (state, a) = seeded(&p, 0, 150);
    let digest = state.digest();
    assert_eq!(p.due_by(&state, 1_000), vec![a]);
    assert_eq!(state.digest(), digest);
    assert!(state.contains(&a));
}

#[test]
fn nothing_is_evictable_before_upgrade() {
    let p = processor(params(EvictionBoundary::Inclusive));
    let (state, a) = seeded(&p, 0, 5);
    assert!(!p.is_evictable(&state, &a, UPGRADE - 1));
    assert!(p.due_by(&state, UPGRADE - 1).is_empty());
    assert!(p.is_evictable(&state, &a, UPGRADE));
}
