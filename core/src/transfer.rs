//! Owner-gated releases: `pay` and `withdraw`.
//!
//! Both issue a zero-fee payment from the application account and debit the
//! escrow total only after the payment has been handed to the runtime. The
//! runtime commits the two together or not at all.

use crate::contract::Effects;
use crate::identity::Address;
use crate::state::ContractState;
use crate::txn::InnerPayment;
use crate::{EscrowError, Result};

/// Pay `amount` from the pool to `recipient`, attaching `note`.
pub fn pay(
    state: &mut ContractState,
    caller: &Address,
    recipient: Address,
    amount: u64,
    note: &str,
    effects: &mut Effects,
) -> Result<u64> {
    authorize_release(state, caller, amount)?;
    release(
        state,
        InnerPayment::fee_free(recipient, amount, note.as_bytes().to_vec()),
        effects,
    )
}

/// Return `amount` from the pool to the owner.
pub fn withdraw(
    state: &mut ContractState,
    caller: &Address,
    amount: u64,
    effects: &mut Effects,
) -> Result<u64> {
    authorize_release(state, caller, amount)?;
    let owner = *state.owner();
    release(
        state,
        InnerPayment::fee_free(owner, amount, Vec::new()),
        effects,
    )
}

fn authorize_release(state: &ContractState, caller: &Address, amount: u64) -> Result<()> {
    if caller != state.owner() {
        return Err(EscrowError::NotOwner { caller: *caller });
    }
    if amount == 0 {
        return Err(EscrowError::ZeroAmount);
    }
    if amount > state.total() {
        return Err(EscrowError::InsufficientEscrow {
            available: state.total(),
            requested: amount,
        });
    }
    Ok(())
}

fn release(state: &mut ContractState, payment: InnerPayment, effects: &mut Effects) -> Result<u64> {
    let amount = payment.amount;
    effects.submit(payment);
    state.subtract(amount)
}
