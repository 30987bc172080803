//! Simulated ledger hosting Payescrow applications.
//!
//! The [`Ledger`] executes atomic groups of payments and application calls,
//! committing a group only when every entry succeeds. The `payescrow`
//! binary replays JSON scripts against it.

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{GenesisConfig, LedgerSnapshot, ReplayReport, Script, Step};
pub use error::{LedgerError, Result};
pub use runtime::{Application, EntryReceipt, GroupReceipt, Ledger, FIRST_APP_ID};
