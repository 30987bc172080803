//! Deposit validation against the co-submitted payment.
//!
//! The ledger settles the payment and the deposit call as separate entries
//! of one atomic group, so the call proves its funding by inspecting the
//! entry immediately before it.

use crate::identity::Address;
use crate::state::ContractState;
use crate::txn::Transaction;
use crate::{EscrowError, Result};

/// Amount the grouped payment at `group[call_index - 1]` moves into
/// `app_address`.
///
/// Checks, in order: a preceding entry exists, it is a payment, it targets
/// the application account, it moves a non-zero amount.
pub fn grouped_deposit_amount(
    group: &[Transaction],
    call_index: usize,
    app_address: &Address,
) -> Result<u64> {
    if group.len() < 2 || call_index == 0 {
        return Err(EscrowError::MissingGroupedTransfer);
    }
    let prev = group
        .get(call_index - 1)
        .ok_or(EscrowError::MissingGroupedTransfer)?;

    let Transaction::Payment {
        receiver, amount, ..
    } = prev
    else {
        return Err(EscrowError::WrongTransactionType(prev.txn_type()));
    };

    if receiver != app_address {
        return Err(EscrowError::WrongReceiver {
            expected: *app_address,
            found: *receiver,
        });
    }
    if *amount == 0 {
        return Err(EscrowError::ZeroAmount);
    }
    Ok(*amount)
}

/// Validate the grouped payment and credit it to the escrow total.
///
/// Returns the new total. `state` is untouched on error.
pub fn validate_and_record_deposit(
    state: &mut ContractState,
    group: &[Transaction],
    call_index: usize,
    app_address: &Address,
) -> Result<u64> {
    let amount = grouped_deposit_amount(group, call_index, app_address)?;
    state.add(amount)
}
