//! Extension hooks invoked at fixed points of the [`Ledger`](crate::Ledger)
//! lifecycle.

use crate::{Error, HookError, Result, Transaction};
use std::fmt;

/// The lifecycle points an [`Extension`] can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Parse,
    Add,
    Filter,
    Report,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookEvent::Parse => write!(f, "on-parse"),
            HookEvent::Add => write!(f, "on-add"),
            HookEvent::Filter => write!(f, "on-filter"),
            HookEvent::Report => write!(f, "on-report"),
        }
    }
}

/// An observer registered on a [`Ledger`](crate::Ledger). Every callback has
/// a pass-through default, so an extension only implements the ones it needs.
pub trait Extension {
    /// Identifies the extension in error messages.
    fn name(&self) -> &str;

    /// Called for each transaction read by a load. Returning an error aborts
    /// the load.
    fn on_parse(&mut self, _txn: &Transaction) -> std::result::Result<(), HookError> {
        Ok(())
    }

    /// Called before a transaction is inserted. Returning an error rejects it.
    fn on_add(&mut self, _txn: &Transaction) -> std::result::Result<(), HookError> {
        Ok(())
    }

    /// Transforms the output of the previous extension in the chain.
    fn on_filter(&self, txns: Vec<Transaction>) -> Vec<Transaction> {
        txns
    }

    /// Produces a report section. Empty strings are dropped.
    fn on_report(&self, _txns: &[Transaction]) -> String {
        String::new()
    }
}

/// Holds extensions in registration order and runs each lifecycle event
/// through them.
#[derive(Default)]
pub struct ExtensionManager {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Box<dyn Extension>) {
        log::debug!("registered extension {}", extension.name());
        self.extensions.push(extension);
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    fn wrap(extension: &dyn Extension, event: HookEvent, source: HookError) -> Error {
        Error::Hook {
            name: extension.name().to_string(),
            event,
            source,
        }
    }

    pub fn on_parse(&mut self, txn: &Transaction) -> Result<()> {
        for extension in self.extensions.iter_mut() {
            log::trace!("{} on-parse {}", extension.name(), txn.description());
            extension
                .on_parse(txn)
                .map_err(|e| Self::wrap(&**extension, HookEvent::Parse, e))?;
        }
        Ok(())
    }

    pub fn on_add(&mut self, txn: &Transaction) -> Result<()> {
        for extension in self.extensions.iter_mut() {
            log::trace!("{} on-add {}", extension.name(), txn.description());
            extension
                .on_add(txn)
                .map_err(|e| Self::wrap(&**extension, HookEvent::Add, e))?;
        }
        Ok(())
    }

    pub fn on_filter(&self, txns: Vec<Transaction>) -> Vec<Transaction> {
        self.extensions
            .iter()
            .fold(txns, |txns, extension| extension.on_filter(txns))
    }

    pub fn on_report(&self, txns: &[Transaction]) -> Vec<String> {
        self.extensions
            .iter()
            .map(|extension| extension.on_report(txns))
            .filter(|report| !report.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Date, Decimal, Posting};

    fn txn(description: &str, number: i64) -> Transaction {
        let date: Date = "2024-01-01".parse().unwrap();
        Transaction::new(
            date,
            description,
            vec![
                Posting::new("expenses:misc", Amount::new(Decimal::from(number), "USD")),
                Posting::new("assets:cash", Amount::new(Decimal::from(-number), "USD")),
            ],
        )
    }

    struct MinAmount(i64);

    impl Extension for MinAmount {
        fn name(&self) -> &str {
            "min-amount"
        }

        fn on_filter(&self, txns: Vec<Transaction>) -> Vec<Transaction> {
            txns.into_iter()
                .filter(|t| t.postings()[0].amount.number >= Decimal::from(self.0))
                .collect()
        }

        fn on_report(&self, txns: &[Transaction]) -> String {
            format!("{} transactions", txns.len())
        }
    }

    struct Reverse;

    impl Extension for Reverse {
        fn name(&self) -> &str {
            "reverse"
        }

        fn on_filter(&self, mut txns: Vec<Transaction>) -> Vec<Transaction> {
            txns.reverse();
            txns
        }
    }

    #[test]
    fn filters_form_a_pipeline() {
        let mut manager = ExtensionManager::new();
        manager.register(Box::new(MinAmount(5)));
        manager.register(Box::new(Reverse));
        let out = manager.on_filter(vec![txn("a", 10), txn("b", 1), txn("c", 7)]);
        let names: Vec<_> = out.iter().map(|t| t.description().as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn reports_skip_empty_output() {
        let mut manager = ExtensionManager::new();
        manager.register(Box::new(Reverse));
        manager.register(Box::new(MinAmount(0)));
        assert_eq!(manager.on_report(&[txn("a", 1)]), vec!["1 transactions"]);
    }

    #[test]
    fn empty_manager_passes_everything_through() {
        let mut manager = ExtensionManager::new();
        assert!(manager.is_empty());
        manager.on_parse(&txn("a", 1)).unwrap();
        manager.on_add(&txn("a", 1)).unwrap();
        assert_eq!(manager.on_filter(vec![txn("a", 1)]).len(), 1);
        assert!(manager.on_report(&[]).is_empty());
    }
}
