use crate::Location;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    /// `YYYY-MM-DD`
    Date,
    /// A word or a run of description text.
    Text,
    /// `expenses:food`
    Account,
    /// `-$45.32`
    Amount,
    NewLine,
    /// Two or more spaces or tabs at the start of a line.
    Indent,
    /// `;` up to the end of the line.
    Comment,
    /// A single character no other rule accepts.
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Date => "date",
            TokenKind::Text => "text",
            TokenKind::Account => "account",
            TokenKind::Amount => "amount",
            TokenKind::NewLine => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Comment => "comment",
            TokenKind::Error => "invalid character",
        };
        f.write_str(name)
    }
}

/// A token and the slice of source text it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'source> {
    pub kind: TokenKind,
    pub text: &'source str,
    /// Where the token starts. Newline tokens carry the line they close.
    pub location: Location,
}

impl<'source> Token<'source> {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof | TokenKind::NewLine | TokenKind::Indent => write!(f, "{}", self.kind),
            _ => write!(f, "{}({:?})", self.kind, self.text),
        }
    }
}
