/// Method calls and their on-ledger argument encodings
pub mod abi;
/// Call dispatch and the all-or-nothing call outcome
pub mod contract;
/// Deposit validation against the grouped payment
pub mod deposit;
/// Identities of parties and application accounts
pub mod identity;
/// Persistent escrow record and ledger storage mapping
pub mod state;
/// Owner-gated payouts and withdrawals
pub mod transfer;
/// Group entries and contract-originated payments
pub mod txn;

pub mod error;
#[cfg(feature = "json")]
pub mod interface;
mod serde;

pub use abi::{Encoding, Method, ReturnValue};
pub use contract::{execute, CallContext, Outcome};
pub use error::{AbiError, EscrowError, IdentityError};
pub use identity::Address;
pub use state::{ContractState, GlobalState, Lifecycle, StateDelta, StateValue};
pub use txn::{InnerPayment, Transaction, TxnType, MAX_GROUP_SIZE};

pub type Result<T> = std::result::Result<T, EscrowError>;
