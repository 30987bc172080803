//! JSON inputs and outputs of the replay tool.

use anyhow::Context;
use payescrow_core::{
    AbiError, Address, ContractState, Encoding, Method, Transaction, MAX_GROUP_SIZE,
};
use serde::{Deserialize, Serialize};

/// Default path to the genesis balances file.
pub const DEFAULT_GENESIS_PATH: &str = "./genesis.json";

/// Default path to the replay script.
pub const DEFAULT_SCRIPT_PATH: &str = "./script.json";

/// Initial balances of the simulated ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisConfig {
    pub accounts: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: Address,
    pub balance: u64,
}

/// Ordered atomic groups to submit, one after another.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Script {
    pub groups: Vec<Vec<Step>>,
}

impl Script {
    /// Expand every group into ledger transactions.
    pub fn transactions(&self) -> Vec<Result<Vec<Transaction>, AbiError>> {
        self.groups.iter().map(|group| expand(group)).collect()
    }
}

/// Expand one scripted group into ledger transactions.
pub fn expand(group: &[Step]) -> Result<Vec<Transaction>, AbiError> {
    let mut txns = Vec::with_capacity(group.len());
    for step in group {
        txns.extend(step.to_transactions()?);
    }
    Ok(txns)
}

/// One scripted action. A deposit expands into the two-entry group
/// prefix `[payment to the application, deposit call]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Payment {
        sender: Address,
        receiver: Address,
        amount: u64,
        #[serde(default)]
        note: String,
    },
    Deposit {
        sender: Address,
        app_id: u64,
        amount: u64,
        #[serde(default)]
        encoding: Encoding,
    },
    /// Application call; `app_id` 0 (the default) creates an application.
    Call {
        sender: Address,
        #[serde(default)]
        app_id: u64,
        method: Method,
        #[serde(default)]
        encoding: Encoding,
    },
}

impl Step {
    pub fn to_transactions(&self) -> Result<Vec<Transaction>, AbiError> {
        let txns = match self {
            Self::Payment {
                sender,
                receiver,
                amount,
                note,
            } => vec![Transaction::Payment {
                sender: *sender,
                receiver: *receiver,
                amount: *amount,
                note: note.as_bytes().to_vec(),
            }],
            Self::Deposit {
                sender,
                app_id,
                amount,
                encoding,
            } => vec![
                Transaction::Payment {
                    sender: *sender,
                    receiver: Address::for_application(*app_id),
                    amount: *amount,
                    note: Vec::new(),
                },
                app_call(*sender, *app_id, &Method::Deposit, *encoding)?,
            ],
            Self::Call {
                sender,
                app_id,
                method,
                encoding,
            } => vec![app_call(*sender, *app_id, method, *encoding)?],
        };
        Ok(txns)
    }
}

/// Build an application call carrying `method` in `encoding`.
pub fn app_call(
    sender: Address,
    app_id: u64,
    method: &Method,
    encoding: Encoding,
) -> Result<Transaction, AbiError> {
    let (args, accounts) = method.encode(encoding)?;
    Ok(Transaction::AppCall {
        sender,
        app_id,
        args,
        accounts,
    })
}

/// Ledger contents after a replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub balances: Vec<AccountBalance>,
    pub applications: Vec<ApplicationSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationSnapshot {
    pub app_id: u64,
    /// The application account holding escrowed funds.
    pub address: Address,
    pub creator: Address,
    pub state: Option<ContractState>,
}

/// Outcome of replaying a [`Script`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayReport {
    pub committed: usize,
    pub rejected: Vec<RejectedGroup>,
    pub snapshot: LedgerSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedGroup {
    /// Position of the group in the script.
    pub group: usize,
    pub error: String,
}

/// Fails early on groups that cannot be encoded or that the ledger would
/// refuse by size alone.
pub fn check_group_sizes(script: &Script) -> anyhow::Result<()> {
    for (i, group) in script.transactions().into_iter().enumerate() {
        let group = group.with_context(|| format!("encoding group {i}"))?;
        anyhow::ensure!(!group.is_empty(), "group {i} is empty");
        anyhow::ensure!(
            group.len() <= MAX_GROUP_SIZE,
            "group {i} expands to {} transactions (max {MAX_GROUP_SIZE})",
            group.len()
        );
    }
    Ok(())
}
