use payescrow_core::{AbiError, Address, EscrowError, TxnType};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Reasons the simulated ledger rejects an atomic group.
///
/// `index` is the position of the offending entry in the group. A rejected
/// group leaves the ledger exactly as it was before submission.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("empty group")]
    EmptyGroup,

    #[error("group of {size} exceeds the maximum of {max}")]
    GroupTooLarge { size: usize, max: usize },

    #[error("entry {index}: {account} holds {balance}, needs {needed}")]
    Overdraft {
        index: usize,
        account: Address,
        balance: u64,
        needed: u64,
    },

    #[error("entry {index}: unknown application {app_id}")]
    UnknownApp { index: usize, app_id: u64 },

    /// Application accounts have no signing key; only inner payments of
    /// their own application may spend from them.
    #[error("entry {index}: {account} is an application account")]
    UnauthorizedSender { index: usize, account: Address },

    #[error("{0} is not a query method")]
    NotReadOnly(&'static str),

    #[error("cannot encode call: {0}")]
    Encode(#[from] AbiError),

    #[error("entry {index}: unsupported transaction type {kind}")]
    UnsupportedTransaction { index: usize, kind: TxnType },

    #[error("entry {index}: rejected by application: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: EscrowError,
    },

    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("application {app_id} has unreadable storage: {source}")]
    Storage {
        app_id: u64,
        #[source]
        source: EscrowError,
    },
}

impl LedgerError {
    /// Contract error behind a rejection, if any.
    pub fn escrow_error(&self) -> Option<&EscrowError> {
        match self {
            Self::Rejected { source, .. } => Some(source),
            _ => None,
        }
    }
}
