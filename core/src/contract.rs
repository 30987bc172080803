//! Escrow call dispatch.
//!
//! [`execute`] is the single entry point a runtime invokes per application
//! call. It works on a scratch copy of the record and returns either a
//! complete [`Outcome`] or an error with nothing to apply.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::abi::{Method, ReturnValue};
use crate::deposit::validate_and_record_deposit;
use crate::identity::Address;
use crate::state::{ContractState, Lifecycle, StateDelta};
use crate::transfer::{pay, withdraw};
use crate::txn::{InnerPayment, Transaction};
use crate::{EscrowError, Result};

/// Everything the runtime knows about the call being executed.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub app_id: u64,
    /// Account controlled by the application.
    pub app_address: Address,
    pub caller: Address,
    /// The full atomic group this call was submitted in.
    pub group: &'a [Transaction],
    /// Position of this call within `group`.
    pub group_index: usize,
    /// True only for the call that creates the application.
    pub is_genesis: bool,
}

/// Side effects collected while a call runs.
#[derive(Debug, Default)]
pub struct Effects {
    inner_payments: Vec<InnerPayment>,
    logs: Vec<Vec<u8>>,
}

impl Effects {
    /// Queue a payment for the runtime to originate from the application
    /// account.
    pub fn submit(&mut self, payment: InnerPayment) {
        self.inner_payments.push(payment);
    }

    pub fn log(&mut self, line: Vec<u8>) {
        self.logs.push(line);
    }

    pub fn inner_payments(&self) -> &[InnerPayment] {
        &self.inner_payments
    }
}

/// Result of a successful call, applied by the runtime as one unit.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct Outcome {
    pub deltas: Vec<StateDelta>,
    pub inner_payments: Vec<InnerPayment>,
    pub logs: Vec<Vec<u8>>,
    pub return_value: Option<ReturnValue>,
}

impl Outcome {
    /// True when the call changes neither storage nor balances.
    pub fn is_read_only(&self) -> bool {
        self.deltas.is_empty() && self.inner_payments.is_empty()
    }
}

/// Run `method` against `state` (`None` before `create`).
///
/// # Errors
///
/// Any [`EscrowError`]; the caller must then discard the whole call.
pub fn execute(
    state: Option<&ContractState>,
    ctx: &CallContext<'_>,
    method: &Method,
) -> Result<Outcome> {
    let current = match (Lifecycle::of(state), method) {
        (Lifecycle::Uninitialized, Method::Create) => {
            let created = ContractState::initialize(ctx.caller, ctx.is_genesis)?;
            return Ok(Outcome {
                deltas: created.deltas_from(None),
                ..Outcome::default()
            });
        }
        (_, _) if ctx.is_genesis => return Err(EscrowError::NotInitialized),
        (_, _) => state.ok_or(EscrowError::NotInitialized)?,
    };

    let mut scratch = current.clone();
    let mut effects = Effects::default();

    let return_value = match method {
        Method::Create => return Err(EscrowError::AlreadyInitialized),
        Method::Deposit => {
            validate_and_record_deposit(&mut scratch, ctx.group, ctx.group_index, &ctx.app_address)?;
            None
        }
        Method::Pay {
            recipient,
            amount,
            note,
        } => {
            pay(&mut scratch, &ctx.caller, *recipient, *amount, note, &mut effects)?;
            None
        }
        Method::Withdraw { amount } => {
            withdraw(&mut scratch, &ctx.caller, *amount, &mut effects)?;
            None
        }
        Method::Balance => Some(ReturnValue::Uint(scratch.total())),
        Method::GetOwner => Some(ReturnValue::Address(*scratch.owner())),
    };

    if let Some(value) = &return_value {
        effects.log(value.to_log());
    }

    Ok(Outcome {
        deltas: scratch.deltas_from(Some(current)),
        inner_payments: effects.inner_payments,
        logs: effects.logs,
        return_value,
    })
}
