use thiserror::Error;

use crate::identity::Address;
use crate::txn::TxnType;

/// Reasons an escrow call is rejected.
///
/// Every variant aborts the whole call and the atomic group it belongs to;
/// none of them leaves a partial state change behind.
#[derive(Debug, Error, PartialEq)]
pub enum EscrowError {
    /// `create` was invoked on an application that already exists.
    #[error("contract already initialized")]
    AlreadyInitialized,

    /// A non-`create` method reached an application without state,
    /// or the genesis call was not `create`.
    #[error("contract not initialized")]
    NotInitialized,

    /// Caller is not the recorded owner.
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Requested release exceeds the tracked escrow total.
    #[error("insufficient escrow balance (available={available}, requested={requested})")]
    InsufficientEscrow { available: u64, requested: u64 },

    /// Deposit call has no preceding entry in its group.
    #[error("deposit must be preceded by a grouped payment")]
    MissingGroupedTransfer,

    /// The entry preceding a deposit is not a plain payment.
    #[error("grouped transaction must be a payment, found {0}")]
    WrongTransactionType(TxnType),

    /// The grouped payment does not target the application account.
    #[error("payment must go to {expected}, found {found}")]
    WrongReceiver { expected: Address, found: Address },

    #[error("escrow total overflow")]
    Overflow,

    /// Global state is missing a key or holds the wrong value type.
    #[error("corrupt global state: {0}")]
    CorruptState(&'static str),

    #[error("identity error: {0}")]
    Identity(IdentityError),

    #[error("abi error: {0}")]
    Abi(AbiError),
}

/// Errors that might occur while parsing into an [`Address`].
#[derive(Debug, Error, PartialEq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,

    #[error("identity must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors when encoding or decoding application-call arguments.
#[derive(Debug, Error, PartialEq)]
pub enum AbiError {
    #[error("application call carries no method")]
    MissingMethod,

    #[error("unknown method: 0x{}", hex::encode(.0))]
    UnknownMethod(Vec<u8>),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// Integer argument longer than 8 bytes.
    #[error("invalid uint64 argument ({0} bytes)")]
    InvalidUint(usize),

    #[error("invalid string argument")]
    InvalidString,

    /// String argument past the 2-byte length prefix limit.
    #[error("string argument too long ({0} bytes)")]
    StringTooLong(usize),

    /// Account reference outside the call's accounts array.
    #[error("account index {0} out of range")]
    AccountIndex(u8),
}

impl From<IdentityError> for EscrowError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<AbiError> for EscrowError {
    fn from(value: AbiError) -> Self {
        Self::Abi(value)
    }
}
