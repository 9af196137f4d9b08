use crate::{category, utils::format_number, Account, Balances, Decimal, Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Categories in the order they appear in a [`BalanceReport`].
pub const CATEGORY_ORDER: [&str; 5] = ["assets", "liabilities", "equity", "income", "expenses"];

const TITLE: &str = "BALANCE REPORT";
const RULE_WIDTH: usize = 46;
const NAME_WIDTH: usize = 40;
const NUMBER_WIDTH: usize = 10;

/// The accounts of one category and their subtotal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySection {
    pub category: String,
    /// Accounts sorted by full path.
    pub accounts: Vec<(Account, Decimal)>,
    pub subtotal: Decimal,
}

/// Account balances grouped by category.
///
/// Sections follow [`CATEGORY_ORDER`]; other categories come after them in
/// lexicographic order. Categories without accounts have no section.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalanceReport {
    pub sections: Vec<CategorySection>,
    total: Decimal,
}

fn checked_sum<'a>(mut numbers: impl Iterator<Item = &'a Decimal>, what: &str) -> Result<Decimal> {
    numbers
        .try_fold(Decimal::ZERO, |sum, number| sum.checked_add(*number))
        .ok_or_else(|| Error::semantic(format!("amount overflow in {}", what), None))
}

impl BalanceReport {
    pub fn new(balances: &Balances) -> Result<Self> {
        let mut groups: BTreeMap<&str, Vec<(Account, Decimal)>> = BTreeMap::new();
        for (account, number) in balances.iter() {
            groups
                .entry(category(account))
                .or_default()
                .push((account.clone(), *number));
        }
        let mut sections = Vec::with_capacity(groups.len());
        for name in CATEGORY_ORDER.iter() {
            if let Some(accounts) = groups.remove(name) {
                sections.push(CategorySection::new(name, accounts)?);
            }
        }
        for (name, accounts) in groups {
            sections.push(CategorySection::new(name, accounts)?);
        }
        let total = checked_sum(sections.iter().map(|s| &s.subtotal), "the report total")?;
        Ok(BalanceReport { sections, total })
    }

    /// Sum of all subtotals; equals the sum of all balances.
    pub fn total(&self) -> Decimal {
        self.total
    }
}

impl CategorySection {
    fn new(category: &str, mut accounts: Vec<(Account, Decimal)>) -> Result<Self> {
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        let subtotal = checked_sum(
            accounts.iter().map(|(_, number)| number),
            &format!("the {} subtotal", category),
        )?;
        Ok(CategorySection {
            category: category.to_string(),
            accounts,
            subtotal,
        })
    }
}

impl fmt::Display for CategorySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.category.to_uppercase())?;
        for (account, number) in self.accounts.iter() {
            writeln!(
                f,
                "  {:<name$} {:>num$}",
                account.as_str(),
                format_number(number.round_dp(2)),
                name = NAME_WIDTH,
                num = NUMBER_WIDTH
            )?;
        }
        writeln!(
            f,
            "  {:<name$} {:>num$}",
            "Total",
            format_number(self.subtotal.round_dp(2)),
            name = NAME_WIDTH,
            num = NUMBER_WIDTH
        )
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", "═".repeat(RULE_WIDTH))?;
        writeln!(f)?;
        for section in self.sections.iter() {
            writeln!(f, "{}", section)?;
        }
        Ok(())
    }
}
