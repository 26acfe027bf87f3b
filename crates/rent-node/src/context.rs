//! Per-transaction execution view.
//!
//! [`TxContext`] is what an execution engine sees while running one
//! transaction: plain value, code and storage effects with the rent hooks
//! wired in, plus the set of touched accounts that
//! [`finalize`](TxContext::finalize) applies the end-of-transaction rule to.

use std::collections::BTreeSet;

use rent_core::error::{PrecompileError, RentError};
use rent_core::types::{Address, Word};

use crate::dispatch::{OpOutput, RentOp};
use crate::precompile;
use crate::processor::{FinalizeReport, RentProcessor};
use crate::state::WorldState;

/// Mutable view of the world state for one transaction at one block.
pub struct TxContext<'a> {
    processor: &'a RentProcessor,
    state: &'a mut WorldState,
    block: u64,
    touched: BTreeSet<Address>,
}

impl<'a> TxContext<'a> {
    pub fn new(processor: &'a RentProcessor, state: &'a mut WorldState, block: u64) -> Self {
        Self {
            processor,
            state,
            block,
            touched: BTreeSet::new(),
        }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    pub fn state(&self) -> &WorldState {
        &*self.state
    }

    pub fn processor(&self) -> &RentProcessor {
        self.processor
    }

    pub fn touched(&self) -> &BTreeSet<Address> {
        &self.touched
    }

    /// Mark an account as touched without changing it.
    pub fn touch(&mut self, address: Address) {
        self.touched.insert(address);
    }

    /// Spendable balance of `address`.
    pub fn balance(&self, address: &Address) -> u64 {
        self.state.account(address).map_or(0, |a| a.balance)
    }

    /// Move spendable value from `from` to `to`.
    ///
    /// A non-zero transfer runs the value-receipt rent hook on `to` before
    /// the value is credited.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u64) -> Result<(), RentError> {
        self.touch(from);
        self.touch(to);
        if amount == 0 {
            return Ok(());
        }

        let have = self.balance(&from);
        if have < amount {
            return Err(RentError::InsufficientFunds { have, need: amount });
        }
        if from != to {
            self.balance(&to)
                .checked_add(amount)
                .ok_or(RentError::ValueOverflow)?;
        }

        if let Some(mut sender) = self.state.account(&from).cloned() {
            sender.balance -= amount;
            self.state.put_account(from, sender);
        }

        self.processor
            .on_value_transfer(&mut *self.state, to, amount, self.block);

        if let Some(mut recipient) = self.state.account(&to).cloned() {
            recipient.balance = recipient
                .balance
                .checked_add(amount)
                .ok_or(RentError::ValueOverflow)?;
            self.state.put_account(to, recipient);
        }
        Ok(())
    }

    /// Credit newly issued value (block rewards, genesis allocations).
    pub fn mint(&mut self, to: Address, amount: u64) -> Result<(), RentError> {
        self.touch(to);
        if amount == 0 {
            return Ok(());
        }
        self.balance(&to)
            .checked_add(amount)
            .ok_or(RentError::ValueOverflow)?;

        self.processor
            .on_value_transfer(&mut *self.state, to, amount, self.block);
        if let Some(mut recipient) = self.state.account(&to).cloned() {
            recipient.balance += amount;
            self.state.put_account(to, recipient);
        }
        Ok(())
    }

    /// Write a contract storage slot. Returns the previous value.
    pub fn storage_write(&mut self, address: Address, key: Word, value: Word) -> Word {
        self.touch(address);
        self.processor
            .on_storage_write(&mut *self.state, address, key, value, self.block)
    }

    pub fn storage(&self, address: &Address, key: &Word) -> Word {
        self.state.storage(address, key)
    }

    /// Deploy `code` at `address`.
    ///
    /// Runs the creation hook first, then installs the code, which moves the
    /// eviction block to reflect the new code size.
    pub fn create_account(&mut self, address: Address, code: Vec<u8>) {
        self.touch(address);
        self.processor
            .on_account_create(&mut *self.state, address, self.block);
        if let Some(mut account) = self.state.account(&address).cloned() {
            account.set_code(self.processor.calculator(), code);
            account.nonce = account.nonce.max(1);
            self.state.put_account(address, account);
        }
    }

    /// `SENDRENT`: pay `amount` of `payer`'s balance into `recipient`'s rent.
    pub fn send_rent(&mut self, payer: Address, recipient: Address, amount: u64) -> Result<(), RentError> {
        self.touch(payer);
        self.touch(recipient);
        self.processor
            .on_direct_payment(&mut *self.state, payer, recipient, amount, self.block)
    }

    /// `RENTBALANCE`: stored rent balance, without settling.
    pub fn rent_balance(&self, address: &Address) -> u64 {
        self.processor.rent_balance_of(&*self.state, address)
    }

    /// Execute a rent opcode on behalf of `caller`.
    pub fn execute(&mut self, caller: Address, op: &RentOp) -> Result<OpOutput, RentError> {
        match *op {
            RentOp::RentBalance { address } => Ok(OpOutput::Balance(self.rent_balance(&address))),
            RentOp::SendRent { recipient, amount } => {
                self.send_rent(caller, recipient, amount)?;
                Ok(OpOutput::Sent)
            }
        }
    }

    /// Call the rent precompile. On failure every write made by the call is
    /// undone and the error is returned to the enclosing frame.
    pub fn call_precompile(
        &mut self,
        caller: Address,
        input: &[u8],
        gas_limit: u64,
    ) -> Result<u64, PrecompileError> {
        let checkpoint = self.state.checkpoint();
        match precompile::run(self, caller, input, gas_limit) {
            Ok(gas_used) => {
                self.state.commit(checkpoint);
                Ok(gas_used)
            }
            Err(e) => {
                self.state.revert_to(checkpoint);
                Err(e)
            }
        }
    }

    /// Apply the end-of-transaction rule to every touched account.
    pub fn finalize(self) -> FinalizeReport {
        self.processor
            .finalize_touched(self.state, &self.touched, self.block)
    }
}
