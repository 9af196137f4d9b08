use super::{Token, TokenKind};
use crate::Location;

/// Turns ledger text into [`Token`]s on demand.
///
/// Lines are 1-based and columns 0-based. Leading spaces and tabs are only
/// significant at column 0, where a run of two or more becomes an
/// [`TokenKind::Indent`]; everywhere else they separate tokens.
pub struct Lexer<'source> {
    src: &'source str,
    pos: usize,
    location: Location,
    last_token_start: Location,
    finished: bool,
}

#[derive(Clone, Copy)]
struct Snapshot {
    pos: usize,
    location: Location,
}

#[inline]
fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Exactly `DDDD-DD-DD`.
fn has_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl<'source> Lexer<'source> {
    pub fn new(src: &'source str) -> Self {
        Lexer {
            src,
            pos: 0,
            location: Location { line: 1, col: 0 },
            last_token_start: Location { line: 1, col: 0 },
            finished: false,
        }
    }

    /// Current position of the cursor.
    pub fn location(&self) -> Location {
        self.location
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    #[inline]
    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.location.line += 1;
            self.location.col = 0;
        } else {
            self.location.col += 1;
        }
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) -> &'source str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            location: self.location,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.location = snapshot.location;
    }

    fn token(&self, kind: TokenKind, text: &'source str) -> Token<'source> {
        Token {
            kind,
            text,
            location: self.last_token_start,
        }
    }

    fn since(&self, start: usize) -> &'source str {
        &self.src[start..self.pos]
    }

    /// Produces the next token. After the input is exhausted every call
    /// returns [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token<'source> {
        if self.location.col > 0 {
            self.bump_while(is_blank);
        }
        self.last_token_start = self.location;
        let start = self.pos;

        let c = match self.peek() {
            Some(c) => c,
            None => return self.token(TokenKind::Eof, ""),
        };

        if c == '\n' || (c == '\r' && self.peek_second() == Some('\n')) {
            self.bump_if('\r');
            self.bump();
            return self.token(TokenKind::NewLine, self.since(start));
        }

        if self.location.col == 0 && is_blank(c) {
            let indent = self.bump_while(is_blank);
            if indent.chars().count() >= 2 {
                return self.token(TokenKind::Indent, indent);
            }
            // a single leading blank is ordinary spacing
            return self.next_token();
        }

        if c.is_ascii_digit() {
            let snapshot = self.snapshot();
            let run = self.bump_while(|c| c.is_ascii_digit() || c == '-');
            if has_date_shape(run) {
                return self.token(TokenKind::Date, run);
            }
            self.restore(snapshot);
        }

        if c == '$' || c == '-' || c.is_ascii_digit() {
            self.bump_if('-');
            self.bump_if('$');
            let mut seen_point = false;
            while let Some(c) = self.peek() {
                if c == '.' && !seen_point {
                    seen_point = true;
                } else if !c.is_ascii_digit() {
                    break;
                }
                self.bump();
            }
            if self.pos > start {
                return self.token(TokenKind::Amount, self.since(start));
            }
        }

        if c.is_ascii_alphabetic() {
            let word = self.bump_while(|c| c.is_ascii_alphanumeric() || c == ':' || c == '_');
            let kind = if word.contains(':') {
                TokenKind::Account
            } else {
                TokenKind::Text
            };
            return self.token(kind, word);
        }

        if c == ';' {
            let comment = self.bump_while(|c| c != '\n');
            return self.token(TokenKind::Comment, comment.trim_end());
        }

        loop {
            match self.peek() {
                None | Some('\n') | Some('$') => break,
                Some(' ') if matches!(self.peek_second(), Some('$') | Some('-')) => break,
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = self.since(start).trim();
        if !text.is_empty() {
            return self.token(TokenKind::Text, text);
        }

        self.restore(Snapshot {
            pos: start,
            location: self.last_token_start,
        });
        self.bump();
        self.token(TokenKind::Error, self.since(start))
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Token<'source>;

    /// Yields every token, including one final [`TokenKind::Eof`].
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}
