//! Persistent escrow record and its ledger key/value representation.

use std::collections::BTreeMap;

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::identity::Address;
use crate::{EscrowError, Result};

/// Global-state key holding the owner address.
pub const OWNER_KEY: &[u8] = b"owner";

/// Global-state key holding the escrowed total.
pub const TOTAL_KEY: &[u8] = b"total";

/// Storage schema an escrow application reserves: one uint, one byte slice.
pub const GLOBAL_SCHEMA: StateSchema = StateSchema {
    num_uints: 1,
    num_byte_slices: 1,
};

/// Number of global-state slots per value type.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

/// A value stored under a global-state key.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StateValue {
    Bytes(Vec<u8>),
    Uint(u64),
}

/// An application's global key/value storage as kept by the ledger.
pub type GlobalState = BTreeMap<Vec<u8>, StateValue>;

/// Where an escrow instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No `create` has run yet.
    Uninitialized,
    /// Created; all further operations loop here.
    Active,
}

impl Lifecycle {
    pub fn of(state: Option<&ContractState>) -> Self {
        match state {
            Some(_) => Self::Active,
            None => Self::Uninitialized,
        }
    }
}

/// The escrow record: who owns the pool and how much it tracks.
///
/// `total_escrowed` always equals accepted deposits minus accepted payouts;
/// it can only change through [`ContractState::add`] and
/// [`ContractState::subtract`], which the deposit validator and the transfer
/// issuer call after their own checks pass.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ContractState {
    owner: Address,
    total_escrowed: u64,
}

impl ContractState {
    /// Create the record on the genesis call, making `caller` the owner.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::AlreadyInitialized`] when `is_genesis` is false.
    pub fn initialize(caller: Address, is_genesis: bool) -> Result<Self> {
        if !is_genesis {
            return Err(EscrowError::AlreadyInitialized);
        }
        Ok(Self {
            owner: caller,
            total_escrowed: 0,
        })
    }

    pub fn total(&self) -> u64 {
        self.total_escrowed
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Credit `amount`, returning the new total.
    pub(crate) fn add(&mut self, amount: u64) -> Result<u64> {
        self.total_escrowed = self
            .total_escrowed
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        Ok(self.total_escrowed)
    }

    /// Debit `amount`, returning the new total.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::InsufficientEscrow`] if `amount` exceeds the total.
    pub(crate) fn subtract(&mut self, amount: u64) -> Result<u64> {
        self.total_escrowed = self.total_escrowed.checked_sub(amount).ok_or(
            EscrowError::InsufficientEscrow {
                available: self.total_escrowed,
                requested: amount,
            },
        )?;
        Ok(self.total_escrowed)
    }

    /// Changes that turn `before` (or nothing) into `self`.
    pub fn deltas_from(&self, before: Option<&Self>) -> Vec<StateDelta> {
        let mut deltas = Vec::new();
        if before.map(|b| b.owner) != Some(self.owner) {
            deltas.push(StateDelta::SetOwner(self.owner));
        }
        if before.map(|b| b.total_escrowed) != Some(self.total_escrowed) {
            deltas.push(StateDelta::SetTotal(self.total_escrowed));
        }
        deltas
    }

    pub fn to_global_state(&self) -> GlobalState {
        let mut gs = GlobalState::new();
        for delta in self.deltas_from(None) {
            delta.apply(&mut gs);
        }
        gs
    }

    /// Load the record from ledger storage.
    ///
    /// Returns `Ok(None)` for empty storage (an uninitialized application).
    pub fn from_global_state(gs: &GlobalState) -> Result<Option<Self>> {
        if gs.is_empty() {
            return Ok(None);
        }

        let owner = match gs.get(OWNER_KEY) {
            Some(StateValue::Bytes(raw)) => {
                Address::from_slice(raw).map_err(|_| EscrowError::CorruptState("owner"))?
            }
            _ => return Err(EscrowError::CorruptState("owner")),
        };
        let total_escrowed = match gs.get(TOTAL_KEY) {
            Some(StateValue::Uint(v)) => *v,
            _ => return Err(EscrowError::CorruptState("total")),
        };
        if gs.len() as u64 > GLOBAL_SCHEMA.num_uints + GLOBAL_SCHEMA.num_byte_slices {
            return Err(EscrowError::CorruptState("schema"));
        }

        Ok(Some(Self {
            owner,
            total_escrowed,
        }))
    }
}

/// A single change to escrow storage, produced by a successful call.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StateDelta {
    SetOwner(Address),
    SetTotal(u64),
}

impl StateDelta {
    pub fn apply(&self, gs: &mut GlobalState) {
        match self {
            Self::SetOwner(owner) => {
                gs.insert(OWNER_KEY.to_vec(), StateValue::Bytes(owner.0.to_vec()));
            }
            Self::SetTotal(total) => {
                gs.insert(TOTAL_KEY.to_vec(), StateValue::Uint(*total));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address([1u8; 32])
    }

    #[test]
    fn initialize_only_on_genesis() {
        let state = ContractState::initialize(owner(), true).unwrap();
        assert_eq!(state.owner(), &owner());
        assert_eq!(state.total(), 0);

        assert_eq!(
            ContractState::initialize(owner(), false),
            Err(EscrowError::AlreadyInitialized)
        );
    }

    #[test]
    fn subtract_never_goes_negative() {
        let mut state = ContractState::initialize(owner(), true).unwrap();
        assert_eq!(state.add(100).unwrap(), 100);
        assert_eq!(
            state.subtract(101),
            Err(EscrowError::InsufficientEscrow {
                available: 100,
                requested: 101
            })
        );
        assert_eq!(state.total(), 100);
        assert_eq!(state.subtract(100).unwrap(), 0);
    }

    #[test]
    fn add_overflow_is_rejected() {
        let mut state = ContractState::initialize(owner(), true).unwrap();
        state.add(u64::MAX).unwrap();
        assert_eq!(state.add(1), Err(EscrowError::Overflow));
        assert_eq!(state.total(), u64::MAX);
    }

    #[test]
    fn global_state_roundtrip() {
        let mut state = ContractState::initialize(owner(), true).unwrap();
        state.add(600).unwrap();

        let gs = state.to_global_state();
        assert_eq!(gs.get(TOTAL_KEY), Some(&StateValue::Uint(600)));
        assert_eq!(ContractState::from_global_state(&gs).unwrap(), Some(state));
        assert_eq!(
            ContractState::from_global_state(&GlobalState::new()).unwrap(),
            None
        );
    }

    #[test]
    fn corrupt_global_state() {
        let mut gs = GlobalState::new();
        gs.insert(OWNER_KEY.to_vec(), StateValue::Uint(3));
        gs.insert(TOTAL_KEY.to_vec(), StateValue::Uint(0));
        assert_eq!(
            ContractState::from_global_state(&gs),
            Err(EscrowError::CorruptState("owner"))
        );

        let mut gs = GlobalState::new();
        gs.insert(OWNER_KEY.to_vec(), StateValue::Bytes(vec![1, 2]));
        assert_eq!(
            ContractState::from_global_state(&gs),
            Err(EscrowError::CorruptState("owner"))
        );

        let mut gs = ContractState::initialize(owner(), true)
            .unwrap()
            .to_global_state();
        gs.remove(TOTAL_KEY);
        assert_eq!(
            ContractState::from_global_state(&gs),
            Err(EscrowError::CorruptState("total"))
        );
    }

    #[test]
    fn deltas_only_cover_changes() {
        let before = ContractState::initialize(owner(), true).unwrap();
        let mut after = before.clone();
        after.add(5).unwrap();

        assert_eq!(after.deltas_from(Some(&before)), vec![StateDelta::SetTotal(5)]);
        assert!(before.deltas_from(Some(&before)).is_empty());
        assert_eq!(
            before.deltas_from(None),
            vec![StateDelta::SetOwner(owner()), StateDelta::SetTotal(0)]
        );
    }

    #[test]
    fn lifecycle_follows_state() {
        let state = ContractState::initialize(owner(), true).unwrap();
        assert_eq!(Lifecycle::of(None), Lifecycle::Uninitialized);
        assert_eq!(Lifecycle::of(Some(&state)), Lifecycle::Active);
    }
}
