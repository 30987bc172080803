//! In-memory ledger that executes atomic groups against escrow applications.

use std::collections::BTreeMap;

use bincode::config::standard;
use bincode::{Decode, Encode};
use payescrow_core::{
    execute, Address, CallContext, ContractState, Encoding, EscrowError, GlobalState,
    InnerPayment, Method, Outcome, ReturnValue, Transaction, TxnType, MAX_GROUP_SIZE,
};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::{
    app_call, AccountBalance, ApplicationSnapshot, GenesisConfig, LedgerSnapshot, RejectedGroup,
    ReplayReport, Script,
};
use crate::error::{LedgerError, Result};

/// Identifier given to the first application created on a fresh ledger.
pub const FIRST_APP_ID: u64 = 1001;

/// A deployed escrow application.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Application {
    pub creator: Address,
    pub global_state: GlobalState,
}

/// Account balances plus deployed applications.
///
/// Every mutation goes through [`Ledger::submit_group`], which either
/// commits a whole group or leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Ledger {
    balances: BTreeMap<Address, u64>,
    apps: BTreeMap<u64, Application>,
    next_app_id: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// What a committed group did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupReceipt {
    /// Application created by this group, if any.
    pub created_app: Option<u64>,
    pub entries: Vec<EntryReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReceipt {
    pub index: usize,
    pub txn_type: TxnType,
    pub app_id: Option<u64>,
    /// Present for application calls only.
    pub outcome: Option<Outcome>,
}

impl GroupReceipt {
    /// Return value of the last application call in the group.
    pub fn return_value(&self) -> Option<&ReturnValue> {
        self.entries
            .iter()
            .rev()
            .filter_map(|e| e.outcome.as_ref())
            .find_map(|o| o.return_value.as_ref())
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            apps: BTreeMap::new(),
            next_app_id: FIRST_APP_ID,
        }
    }

    /// Build a ledger holding the genesis balances.
    pub fn from_genesis(genesis: &GenesisConfig) -> Result<Self> {
        let mut ledger = Self::new();
        for AccountBalance { address, balance } in &genesis.accounts {
            ledger.fund(*address, *balance)?;
        }
        info!(accounts = genesis.accounts.len(), "Loaded genesis balances");
        Ok(ledger)
    }

    /// Mint `amount` into `account`.
    pub fn fund(&mut self, account: Address, amount: u64) -> Result<()> {
        let balance = self.balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(account))?;
        Ok(())
    }

    /// Binary image of the whole ledger, restorable with [`Ledger::restore`].
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, standard())
            .map_err(|e| LedgerError::Checkpoint(e.to_string()))
    }

    pub fn restore(bytes: &[u8]) -> Result<Self> {
        let (ledger, _) = bincode::decode_from_slice(bytes, standard())
            .map_err(|e| LedgerError::Checkpoint(e.to_string()))?;
        Ok(ledger)
    }

    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    pub fn application(&self, app_id: u64) -> Option<&Application> {
        self.apps.get(&app_id)
    }

    /// Id the next created application will receive.
    pub fn next_app_id(&self) -> u64 {
        self.next_app_id
    }

    /// Decoded escrow record of `app_id`; `None` for unknown or
    /// uninitialized applications.
    pub fn escrow_state(&self, app_id: u64) -> Result<Option<ContractState>> {
        match self.apps.get(&app_id) {
            Some(app) => ContractState::from_global_state(&app.global_state)
                .map_err(|source| LedgerError::Storage { app_id, source }),
            None => Ok(None),
        }
    }

    /// Execute `group` atomically.
    ///
    /// # Errors
    ///
    /// The first failing entry rejects the whole group; balances and
    /// application storage are then exactly as before the call.
    pub fn submit_group(&mut self, group: &[Transaction]) -> Result<GroupReceipt> {
        check_size(group)?;
        let _span = info_span!("group", size = group.len()).entered();

        let mut scratch = self.clone();
        match scratch.apply_group(group) {
            Ok(receipt) => {
                *self = scratch;
                info!(created_app = ?receipt.created_app, "Group committed");
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Group rejected");
                Err(e)
            }
        }
    }

    /// Execute `group` without committing anything.
    pub fn simulate(&self, group: &[Transaction]) -> Result<GroupReceipt> {
        check_size(group)?;
        self.clone().apply_group(group)
    }

    /// Call a query method of `app_id` as `caller` without committing.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotReadOnly`] for methods that move funds or change
    /// storage; submit those as a group instead.
    pub fn read_only(
        &self,
        app_id: u64,
        caller: Address,
        method: &Method,
    ) -> Result<Option<ReturnValue>> {
        if !method.is_read_only() {
            return Err(LedgerError::NotReadOnly(method.name()));
        }
        let call = app_call(caller, app_id, method, Encoding::Selector)?;
        let receipt = self.simulate(&[call])?;
        Ok(receipt.return_value().cloned())
    }

    /// Submit every group of `script` in order, recording rejections
    /// instead of stopping at them.
    pub fn replay(&mut self, script: &Script) -> Result<ReplayReport> {
        let mut report = ReplayReport::default();
        for (i, group) in script.transactions().into_iter().enumerate() {
            let submitted = group
                .map_err(LedgerError::from)
                .and_then(|group| self.submit_group(&group));
            match submitted {
                Ok(_) => report.committed += 1,
                Err(e) => report.rejected.push(RejectedGroup {
                    group: i,
                    error: e.to_string(),
                }),
            }
        }
        report.snapshot = self.snapshot()?;
        Ok(report)
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let balances = self
            .balances
            .iter()
            .map(|(address, balance)| AccountBalance {
                address: *address,
                balance: *balance,
            })
            .collect();
        let applications = self
            .apps
            .iter()
            .map(|(app_id, app)| {
                Ok(ApplicationSnapshot {
                    app_id: *app_id,
                    address: Address::for_application(*app_id),
                    creator: app.creator,
                    state: self.escrow_state(*app_id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LedgerSnapshot {
            balances,
            applications,
        })
    }

    fn apply_group(&mut self, group: &[Transaction]) -> Result<GroupReceipt> {
        let mut receipt = GroupReceipt::default();

        for (index, txn) in group.iter().enumerate() {
            debug!(index, kind = %txn.txn_type(), sender = %txn.sender(), "Applying entry");
            if self.is_app_account(txn.sender()) {
                return Err(LedgerError::UnauthorizedSender {
                    index,
                    account: *txn.sender(),
                });
            }
            let entry = match txn {
                Transaction::Payment {
                    sender,
                    receiver,
                    amount,
                    ..
                } => {
                    self.transfer(index, *sender, *receiver, *amount, *amount)?;
                    EntryReceipt {
                        index,
                        txn_type: TxnType::Payment,
                        app_id: None,
                        outcome: None,
                    }
                }
                Transaction::AppCall { .. } => {
                    let (app_id, outcome, created) = self.call_app(group, index)?;
                    if created {
                        receipt.created_app = Some(app_id);
                    }
                    EntryReceipt {
                        index,
                        txn_type: TxnType::AppCall,
                        app_id: Some(app_id),
                        outcome: Some(outcome),
                    }
                }
                other => {
                    return Err(LedgerError::UnsupportedTransaction {
                        index,
                        kind: other.txn_type(),
                    })
                }
            };
            receipt.entries.push(entry);
        }

        Ok(receipt)
    }

    /// Run the application call at `group[index]`, returning the app id,
    /// the call outcome and whether the call created the application.
    fn call_app(&mut self, group: &[Transaction], index: usize) -> Result<(u64, Outcome, bool)> {
        let Transaction::AppCall {
            sender,
            app_id,
            args,
            accounts,
        } = &group[index]
        else {
            return Err(LedgerError::UnsupportedTransaction {
                index,
                kind: group[index].txn_type(),
            });
        };
        let rejected = |source: EscrowError| LedgerError::Rejected { index, source };

        let is_genesis = *app_id == 0;
        let app_id = if is_genesis {
            let id = self.next_app_id;
            self.next_app_id += 1;
            self.apps.insert(
                id,
                Application {
                    creator: *sender,
                    global_state: GlobalState::new(),
                },
            );
            id
        } else if self.apps.contains_key(app_id) {
            *app_id
        } else {
            return Err(LedgerError::UnknownApp {
                index,
                app_id: *app_id,
            });
        };

        let (method, encoding) =
            Method::decode(args, sender, accounts).map_err(|e| rejected(e.into()))?;
        let app_address = Address::for_application(app_id);
        let state = self.escrow_state(app_id)?;
        debug!(
            app_id,
            method = method.name(),
            ?encoding,
            read_only = method.is_read_only(),
            caller = %sender,
            "Calling application"
        );

        let ctx = CallContext {
            app_id,
            app_address,
            caller: *sender,
            group,
            group_index: index,
            is_genesis,
        };
        let outcome = execute(state.as_ref(), &ctx, &method).map_err(rejected)?;

        for InnerPayment {
            receiver,
            amount,
            fee,
            ..
        } in &outcome.inner_payments
        {
            let debit = amount
                .checked_add(*fee)
                .ok_or(LedgerError::BalanceOverflow(app_address))?;
            self.transfer(index, app_address, *receiver, debit, *amount)?;
            debug!(app_id, receiver = %receiver, amount, "Inner payment executed");
        }

        if let Some(app) = self.apps.get_mut(&app_id) {
            for delta in &outcome.deltas {
                delta.apply(&mut app.global_state);
            }
        }

        Ok((app_id, outcome, is_genesis))
    }

    /// True when `account` belongs to a deployed application.
    fn is_app_account(&self, account: &Address) -> bool {
        self.apps
            .keys()
            .any(|id| Address::for_application(*id) == *account)
    }

    /// Move funds: `debit` leaves `from`, `credit` reaches `to`.
    fn transfer(
        &mut self,
        index: usize,
        from: Address,
        to: Address,
        debit: u64,
        credit: u64,
    ) -> Result<()> {
        let balance = self.balance(&from);
        let remaining = balance.checked_sub(debit).ok_or(LedgerError::Overdraft {
            index,
            account: from,
            balance,
            needed: debit,
        })?;
        self.balances.insert(from, remaining);
        self.fund(to, credit)
    }
}

fn check_size(group: &[Transaction]) -> Result<()> {
    if group.is_empty() {
        return Err(LedgerError::EmptyGroup);
    }
    if group.len() > MAX_GROUP_SIZE {
        return Err(LedgerError::GroupTooLarge {
            size: group.len(),
            max: MAX_GROUP_SIZE,
        });
    }
    Ok(())
}
