//! # gledger
//!
//! gledger is a plain-text double-entry bookkeeping tool, and a library for
//! reading, checking and writing ledger files like
//!
//! ```text
//! 2024-01-15 Grocery Store
//!   expenses:groceries  $45.32
//!   assets:checking    -$45.32
//! ```
//!
//! ```
//! use gledger::Ledger;
//!
//! let mut ledger = Ledger::new();
//! ledger
//!     .load("2024-01-15 Grocery Store\n  expenses:groceries  $45.32\n  assets:checking  -$45.32\n")
//!     .unwrap();
//! let balances = ledger.calculate_balances().unwrap();
//! assert_eq!(balances.len(), 2);
//! ```

mod error;
pub mod extension;
mod ledger;
mod options;
pub mod parse;
pub mod report;
pub mod utils;

pub use error::{Error, ErrorType, HookError, Result};
pub use extension::{Extension, HookEvent};
pub use ledger::*;
pub use options::*;
pub use report::BalanceReport;
