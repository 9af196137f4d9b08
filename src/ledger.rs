use crate::{
    extension::{Extension, ExtensionManager},
    parse::Parser,
    report::BalanceReport,
    utils::{format_amount, format_number, write_atomic},
    Error, Options, Result,
};
pub use chrono::NaiveDate as Date;
use getset::{CopyGetters, Getters};
pub use rust_decimal::Decimal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Representing a location, line number and column number, in a source file.
/// Lines start at 1, columns at 0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl From<(usize, usize)> for Location {
    fn from(tuple: (usize, usize)) -> Self {
        Location {
            line: tuple.0,
            col: tuple.1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

pub type Currency = String;

/// A string wrapped in [`Arc`](std::sync::Arc) representing a colon
/// separated account path such as `expenses:food:groceries`.
pub type Account = Arc<String>;

/// Returns the first segment of an account path, e.g. `assets` for
/// `assets:checking`.
pub fn category(account: &str) -> &str {
    account.split(':').next().unwrap_or(account)
}

/// Whether `account` is made of one or more non-empty `:` separated segments.
pub fn is_account_path(account: &str) -> bool {
    account.split(':').all(|segment| !segment.is_empty())
}

/// A signed [`Decimal`] number plus the currency. Positive numbers are
/// debits, negative numbers credits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    pub number: Decimal,
    pub currency: Currency,
}

impl Amount {
    pub fn new(number: Decimal, currency: impl Into<Currency>) -> Self {
        Amount {
            number,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_number(self.number), self.currency)
    }
}

/// A posting like `expenses:groceries  $45.32` inside a [`Transaction`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: Account,
    pub amount: Amount,
}

impl Posting {
    pub fn new(account: impl Into<String>, amount: Amount) -> Self {
        Posting {
            account: Arc::new(account.into()),
            amount,
        }
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(40);
        write!(
            f,
            "{:width$}  {}",
            self.account,
            format_amount(self.amount.number),
            width = width
        )
    }
}

/// A dated, described group of postings.
///
/// Transactions read by the [`Parser`] are always balanced and hold at least
/// two postings. Transactions built with [`Transaction::new`] are checked when
/// they are handed to [`Ledger::add_transaction`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Transaction {
    /// Returns the transaction date.
    #[getset(get_copy = "pub")]
    pub(crate) date: Date,

    /// Returns the description following the date.
    #[getset(get = "pub")]
    pub(crate) description: String,

    /// Returns the postings of this transaction.
    #[getset(get = "pub")]
    pub(crate) postings: Vec<Posting>,
}

impl Transaction {
    pub fn new(date: Date, description: impl Into<String>, postings: Vec<Posting>) -> Self {
        Transaction {
            date,
            description: description.into(),
            postings,
        }
    }

    /// Sum of all posting numbers, or `None` if the sum overflows.
    pub fn balance(&self) -> Option<Decimal> {
        self.postings
            .iter()
            .try_fold(Decimal::ZERO, |sum, p| sum.checked_add(p.amount.number))
    }

    /// Whether the postings sum to within `tolerance` of zero.
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        self.balance().is_some_and(|sum| sum.abs() <= tolerance)
    }

    pub(crate) fn check_balance(
        &self,
        tolerance: Decimal,
        location: Option<Location>,
    ) -> Result<()> {
        let sum = self
            .balance()
            .ok_or_else(|| Error::semantic("amount overflow in transaction", location))?;
        if sum.abs() > tolerance {
            return Err(Error::semantic(
                format!("transaction is not balanced (sum: {})", format_number(sum)),
                location,
            ));
        }
        Ok(())
    }

    /// Checks the invariants every stored transaction must satisfy under
    /// `options`.
    pub fn validate(&self, options: &Options) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::semantic("transaction is missing a description", None));
        }
        if self.postings.len() < 2 {
            return Err(Error::semantic(
                "transaction must have at least two postings",
                None,
            ));
        }
        for posting in self.postings.iter() {
            if !is_account_path(&posting.account) {
                return Err(Error::semantic(
                    format!("invalid account path {:?}", posting.account.as_str()),
                    None,
                ));
            }
            if posting.amount.currency != options.currency {
                return Err(Error::semantic(
                    format!(
                        "posting to {} is in {}, the ledger currency is {}",
                        posting.account, posting.amount.currency, options.currency
                    ),
                    None,
                ));
            }
        }
        self.check_balance(options.tolerance, None)
    }
}

/// Writes the transaction in the ledger text format, without the blank line
/// that separates it from the next one.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.description)?;
        let width = f.width().unwrap_or(40);
        for posting in self.postings.iter() {
            write!(f, "\n  {:width$}", posting, width = width)?;
        }
        Ok(())
    }
}

/// Maps each full account path to the signed sum of its postings.
pub type Balances = BTreeMap<Account, Decimal>;

/// The in-memory ledger: transactions sorted by date, the [`Options`] used to
/// read them, and the registered extensions.
#[derive(Default, Getters)]
pub struct Ledger {
    /// Returns the transactions, sorted by date. Transactions sharing a date
    /// keep their insertion order.
    #[getset(get = "pub")]
    txns: Vec<Transaction>,

    /// Returns the options of this ledger.
    #[getset(get = "pub")]
    options: Options,

    extensions: ExtensionManager,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("txns", &self.txns)
            .field("options", &self.options)
            .field("extensions", &self.extensions.names())
            .finish()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Ledger {
            options,
            ..Default::default()
        }
    }

    /// Appends `extension` to the hook chain. Hooks run in registration order.
    pub fn register<E: Extension + 'static>(&mut self, extension: E) {
        self.extensions.register(Box::new(extension));
    }

    /// Parses `src`, runs the on-parse hooks over every transaction and, if
    /// nothing failed, replaces the current transactions with the result.
    pub fn load(&mut self, src: &str) -> Result<&[Transaction]> {
        let mut txns = Parser::new(src, &self.options)
            .parse()
            .map_err(|e| e.context("failed to parse ledger"))?;
        for txn in txns.iter() {
            self.extensions
                .on_parse(txn)
                .map_err(|e| e.context("failed to load ledger"))?;
        }
        txns.sort_by_key(|txn| txn.date);
        log::debug!("loaded {} transactions", txns.len());
        self.txns = txns;
        Ok(&self.txns)
    }

    /// Reads the file at `path` and [`load`](Ledger::load)s its content.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&[Transaction]> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| Error::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&src)
            .map_err(|e| e.context(format!("failed to load {}", path.display())))
    }

    /// Returns the ledger in its text format. Parsing the result yields the
    /// same transactions.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Writes the ledger to `path`, replacing the file as a whole.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, &self.to_text()).map_err(|source| Error::Io {
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("saved {} transactions to {}", self.txns.len(), path.display());
        Ok(())
    }

    /// Validates `txn`, runs the on-add hooks and inserts it by date. On
    /// error the ledger is left untouched.
    pub fn add_transaction(&mut self, txn: Transaction) -> Result<()> {
        if let Err(e) = txn.validate(&self.options) {
            log::warn!("rejected transaction {:?}: {}", txn.description, e);
            return Err(e.context("failed to add transaction"));
        }
        self.extensions
            .on_add(&txn)
            .map_err(|e| e.context("failed to add transaction"))?;
        self.txns.push(txn);
        self.txns.sort_by_key(|txn| txn.date);
        log::debug!("ledger now holds {} transactions", self.txns.len());
        Ok(())
    }

    /// Sums posting numbers per full account path.
    pub fn calculate_balances(&self) -> Result<Balances> {
        let mut balances = Balances::new();
        for posting in self.txns.iter().flat_map(|txn| txn.postings.iter()) {
            let balance = balances.entry(posting.account.clone()).or_default();
            *balance = balance.checked_add(posting.amount.number).ok_or_else(|| {
                Error::semantic(
                    format!("amount overflow in the balance of {}", posting.account),
                    None,
                )
            })?;
        }
        Ok(balances)
    }

    /// Groups [`calculate_balances`](Ledger::calculate_balances) by category.
    pub fn balance_report(&self) -> Result<BalanceReport> {
        BalanceReport::new(&self.calculate_balances()?)
    }

    /// Renders [`balance_report`](Ledger::balance_report) as text.
    pub fn generate_balance_report(&self) -> Result<String> {
        Ok(self.balance_report()?.to_string())
    }

    /// Runs the on-filter pipeline over a copy of the transactions.
    pub fn filtered_transactions(&self) -> Vec<Transaction> {
        self.extensions.on_filter(self.txns.clone())
    }

    /// Collects the non-empty on-report output of every extension.
    pub fn extension_reports(&self) -> Vec<String> {
        self.extensions.on_report(&self.txns)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, txn) in self.txns.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", txn)?;
        }
        Ok(())
    }
}
