//! The error type shared by the tokenizer, the parser and the [`Ledger`](crate::Ledger).

use crate::{extension::HookEvent, Location};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by an [`Extension`](crate::Extension) callback.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Kinds of errors, without their payload.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// The tokenizer met a character it cannot classify.
    Lex,
    /// The token sequence does not match the ledger grammar.
    Syntax,
    /// Well-formed input with invalid content, e.g. an unbalanced transaction.
    Semantic,
    /// An extension callback failed.
    Hook,
    /// Reading or writing a ledger file failed.
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {}: unrecognized character {text:?}", .location.line)]
    Lex { text: String, location: Location },

    #[error("line {}: {msg}", .location.line)]
    Syntax { msg: String, location: Location },

    #[error("{}{msg}", line_prefix(.location))]
    Semantic {
        msg: String,
        location: Option<Location>,
    },

    #[error("extension {name} failed in {event}: {source}")]
    Hook {
        name: String,
        event: HookEvent,
        #[source]
        source: HookError,
    },

    #[error("couldn't {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

fn line_prefix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!("line {}: ", location.line),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn syntax(msg: impl Into<String>, location: Location) -> Self {
        Error::Syntax {
            msg: msg.into(),
            location,
        }
    }

    pub(crate) fn semantic(msg: impl Into<String>, location: Option<Location>) -> Self {
        Error::Semantic {
            msg: msg.into(),
            location,
        }
    }

    /// Wraps `self` with a description of the operation that failed.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the kind of the innermost error.
    pub fn kind(&self) -> ErrorType {
        match self {
            Error::Lex { .. } => ErrorType::Lex,
            Error::Syntax { .. } => ErrorType::Syntax,
            Error::Semantic { .. } => ErrorType::Semantic,
            Error::Hook { .. } => ErrorType::Hook,
            Error::Io { .. } => ErrorType::Io,
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// Returns the 1-based source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Lex { location, .. } | Error::Syntax { location, .. } => Some(location.line),
            Error::Semantic { location, .. } => location.map(|l| l.line),
            Error::Hook { .. } | Error::Io { .. } => None,
            Error::Context { source, .. } => source.line(),
        }
    }
}
