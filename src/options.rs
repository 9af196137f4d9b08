use crate::{Currency, Decimal};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Currency stamped on every amount read from a ledger file.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Largest absolute posting sum, `0.01`, still accepted as balanced.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Per-ledger settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// The base currency, a 3-letter code.
    pub currency: Currency,
    /// See [`DEFAULT_TOLERANCE`].
    pub tolerance: Decimal,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            currency: DEFAULT_CURRENCY.to_string(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
