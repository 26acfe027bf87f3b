//! Property tests over random transaction sequences.
//!
//! Invariants checked after every transaction:
//! - the eviction schedule mirrors the ledger's derived eviction blocks
//! - `rent_last_paid` never decreases
//! - no touched account is left evictable or empty
//!
//! Plus rollback (revert restores ledger, storage and schedule), eager and
//! lazy migration reaching the same state, and conservation of direct
//! payments.

use std::collections::HashMap;

use proptest::prelude::*;

use rent_core::ledger::Account;
use rent_core::types::{Address, EvictionBoundary};
use rent_node_lib::processor::RentProcessor;
use rent_node_lib::{TxContext, WorldState};
use rent_tests::helpers::*;

#[derive(Clone, Debug)]
enum Op {
    Mint { to: u8, amount: u64 },
    Transfer { from: u8, to: u8, amount: u64 },
    Write { at: u8, key: u8, value: u8 },
    Create { at: u8, code_len: usize },
    SendRent { payer: u8, recipient: u8, amount: u64 },
    Touch { at: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, 1u64..1_000_000).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (0u8..6, 0u8..6, 0u64..500_000)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (0u8..6, 0u8..4, 0u8..3).prop_map(|(at, key, value)| Op::Write { at, key, value }),
        (0u8..6, 0usize..200).prop_map(|(at, code_len)| Op::Create { at, code_len }),
        (0u8..6, 0u8..6, 0u64..200_000)
            .prop_map(|(payer, recipient, amount)| Op::SendRent { payer, recipient, amount }),
        (0u8..6).prop_map(|at| Op::Touch { at }),
    ]
}

/// Ops paired with how many blocks to advance before each.
fn history() -> impl Strategy<Value = Vec<(Op, u64)>> {
    prop::collection::vec((op_strategy(), 0u64..6), 1..40)
}

/// Apply `op`; failures leave state untouched and are ignored here.
fn apply(ctx: &mut TxContext<'_>, op: &Op) {
    match *op {
        Op::Mint { to, amount } => {
            let _ = ctx.mint(addr(to), amount);
        }
        Op::Transfer { from, to, amount } => {
            let _ = ctx.transfer(addr(from), addr(to), amount);
        }
        Op::Write { at, key, value } => {
            ctx.storage_write(addr(at), word(key as u64), word(value as u64));
        }
        Op::Create { at, code_len } => {
            ctx.create_account(addr(at), vec![0x5B; code_len]);
        }
        Op::SendRent {
            payer,
            recipient,
            amount,
        } => {
            let _ = ctx.send_rent(addr(payer), addr(recipient), amount);
        }
        Op::Touch { at } => ctx.touch(addr(at)),
    }
}

/// Run each op as its own finalized transaction. Returns the last block used.
fn replay(p: &RentProcessor, state: &mut WorldState, start: u64, ops: &[(Op, u64)]) -> u64 {
    let mut block = start;
    for (op, advance) in ops {
        block += advance;
        let mut ctx = TxContext::new(p, state, block);
        apply(&mut ctx, op);
        ctx.finalize();
    }
    block
}

fn schedule_mirrors_ledger(state: &WorldState) -> Result<(), TestCaseError> {
    let mut expected = Vec::new();
    for (address, account) in state.ledger().iter() {
        let evict = account.rent().rent_evict_block();
        prop_assert_eq!(state.scheduler().evict_block(address), evict);
        if let Some(b) = evict.block() {
            expected.push((b, *address));
        }
    }
    expected.sort();
    let actual: Vec<(u64, Address)> = state.scheduler().iter().collect();
    prop_assert_eq!(actual, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_after_every_transaction(ops in history(), strict in any::<bool>()) {
        let boundary = if strict { EvictionBoundary::Strict } else { EvictionBoundary::Inclusive };
        let p = processor(params(boundary));
        let mut state = WorldState::new();
        let mut last_paid: HashMap<Address, u64> = HashMap::new();
        let mut block = UPGRADE;

        for (op, advance) in &ops {
            block += advance;
            let mut ctx = TxContext::new(&p, &mut state, block);
            apply(&mut ctx, op);
            let touched = ctx.touched().clone();
            ctx.finalize();

            schedule_mirrors_ledger(&state)?;

            for address in &touched {
                prop_assert!(!p.is_evictable(&state, address, block));
                prop_assert!(!state.account(address).is_some_and(Account::is_empty));
            }

            for (address, account) in state.ledger().iter() {
                let paid = account.rent().rent_last_paid();
                prop_assert!(paid <= block);
                if let Some(prev) = last_paid.insert(*address, paid) {
                    prop_assert!(paid >= prev, "{} went from {} to {}", address, prev, paid);
                }
            }
        }
    }

    #[test]
    fn revert_restores_everything(prefix in history(), suffix in history()) {
        let p = processor(params(EvictionBoundary::Inclusive));
        let mut state = WorldState::new();
        let base = state.checkpoint();
        let block = replay(&p, &mut state, UPGRADE, &prefix);
        state.commit(base);

        let digest = state.digest();
        let schedule: Vec<_> = state.scheduler().iter().collect();
        let slots = state.slot_count();

        let cp = state.checkpoint();
        replay(&p, &mut state, block, &suffix);
        state.revert_to(cp);

        prop_assert_eq!(state.digest(), digest);
        prop_assert_eq!(state.scheduler().iter().collect::<Vec<_>>(), schedule);
        prop_assert_eq!(state.slot_count(), slots);
        schedule_mirrors_ledger(&state)?;
    }

    #[test]
    fn eager_and_lazy_migration_converge(legacy in history(), after in history()) {
        let p = processor(params(EvictionBoundary::Inclusive));
        let mut lazy = WorldState::new();
        let legacy: Vec<_> = legacy.into_iter().map(|(op, _)| (op, 0)).collect();
        replay(&p, &mut lazy, UPGRADE - 1, &legacy);

        let mut eager = lazy.clone();
        p.migrate_all(&mut eager);

        for state in [&mut eager, &mut lazy] {
            let block = replay(&p, state, UPGRADE, &after) + 1;
            let mut ctx = TxContext::new(&p, state, block);
            for seed in 0..6 {
                ctx.touch(addr(seed));
            }
            ctx.finalize();
        }

        prop_assert_eq!(eager.digest(), lazy.digest());
        prop_assert!(lazy.ledger().unsettled_addresses().is_empty());
        schedule_mirrors_ledger(&lazy)?;
    }

    #[test]
    fn direct_payment_conserves_value(
        funded in 1u64..1_000_000,
        amount in 0u64..2_000_000,
        gap in 0u64..50,
    ) {
        let p = processor(params(EvictionBoundary::Inclusive));
        let mut state = WorldState::new();
        let (payer, recipient) = (addr(0), addr(1));
        {
            let mut ctx = TxContext::new(&p, &mut state, UPGRADE);
            ctx.mint(payer, funded).unwrap();
            ctx.mint(recipient, 1).unwrap();
        }

        let balance_before = state.account(&payer).unwrap().balance;
        let rent_before = p.rent_balance_of(&state, &recipient);
        let last_paid_before = state.account(&recipient).unwrap().rent().rent_last_paid();

        let block = UPGRADE + gap;
        let result = p.on_direct_payment(&mut state, payer, recipient, amount, block);

        if amount <= funded {
            prop_assert!(result.is_ok());
            prop_assert_eq!(state.account(&payer).unwrap().balance, balance_before - amount);
            prop_assert_eq!(p.rent_balance_of(&state, &recipient), rent_before + amount);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(state.account(&payer).unwrap().balance, balance_before);
            prop_assert_eq!(p.rent_balance_of(&state, &recipient), rent_before);
        }
        // Direct payment never settles.
        prop_assert_eq!(
            state.account(&recipient).unwrap().rent().rent_last_paid(),
            last_paid_before
        );
    }
}
