//! Ledger transactions as seen by the escrow: group entries and
//! contract-originated payments.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::identity::Address;
#[cfg(feature = "json")]
use crate::serde::{hex_list_serde, utf8_serde};

/// Upper bound on entries in one atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// One entry of an atomic group.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Transaction {
    /// Plain transfer of the native coin.
    Payment {
        sender: Address,
        receiver: Address,
        amount: u64,
        #[cfg_attr(feature = "json", serde(with = "utf8_serde", default))]
        note: Vec<u8>,
    },

    /// Transfer of a ledger-issued asset.
    AssetTransfer {
        sender: Address,
        receiver: Address,
        asset_id: u64,
        amount: u64,
    },

    /// Application call. `app_id == 0` creates a new application.
    AppCall {
        sender: Address,
        app_id: u64,
        #[cfg_attr(feature = "json", serde(with = "hex_list_serde"))]
        args: Vec<Vec<u8>>,
        /// Foreign accounts; index 0 of the on-ledger accounts array
        /// is always the sender, so these start at index 1.
        accounts: Vec<Address>,
    },
}

impl Transaction {
    pub fn sender(&self) -> &Address {
        match self {
            Self::Payment { sender, .. }
            | Self::AssetTransfer { sender, .. }
            | Self::AppCall { sender, .. } => sender,
        }
    }

    pub fn txn_type(&self) -> TxnType {
        match self {
            Self::Payment { .. } => TxnType::Payment,
            Self::AssetTransfer { .. } => TxnType::AssetTransfer,
            Self::AppCall { .. } => TxnType::AppCall,
        }
    }
}

/// Transaction type discriminant.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum TxnType {
    Payment,
    AssetTransfer,
    AppCall,
}

impl AsRef<str> for TxnType {
    fn as_ref(&self) -> &str {
        match self {
            Self::Payment => "pay",
            Self::AssetTransfer => "axfer",
            Self::AppCall => "appl",
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Payment the application account asks the runtime to originate.
///
/// The runtime executes it from the application account within the same
/// atomic commit as the call that issued it.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct InnerPayment {
    pub receiver: Address,
    pub amount: u64,
    /// Fee charged to the application account; the escrow always sets zero.
    pub fee: u64,
    #[cfg_attr(feature = "json", serde(with = "utf8_serde"))]
    pub note: Vec<u8>,
}

impl InnerPayment {
    /// Zero-fee payment, the only kind the escrow issues.
    pub fn fee_free(receiver: Address, amount: u64, note: Vec<u8>) -> Self {
        Self {
            receiver,
            amount,
            fee: 0,
            note,
        }
    }
}
