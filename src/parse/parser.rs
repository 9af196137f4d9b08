use super::{Lexer, Token, TokenKind};
use crate::{
    is_account_path, utils::parse_amount, Account, Amount, Currency, Date, Decimal, Error,
    Options, Posting, Result, Transaction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Recursive-descent parser for the ledger grammar:
///
/// ```text
/// Ledger      := (Transaction | blank-line)*
/// Transaction := DATE TEXT+ NEWLINE Posting{2,}
/// Posting     := INDENT ACCOUNT AMOUNT NEWLINE
/// ```
///
/// The first error aborts the parse.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current: Token<'source>,
    lookahead: Token<'source>,
    currency: Currency,
    tolerance: Decimal,
    accounts: HashMap<&'source str, Account>,
}

/// Parses `src` with the default [`Options`].
pub fn parse(src: &str) -> Result<Vec<Transaction>> {
    Parser::new(src, &Options::default()).parse()
}

impl<'source> Parser<'source> {
    pub fn new(src: &'source str, options: &Options) -> Self {
        let mut lexer = Lexer::new(src);
        let current = Self::significant(&mut lexer);
        let lookahead = Self::significant(&mut lexer);
        Parser {
            lexer,
            current,
            lookahead,
            currency: options.currency.clone(),
            tolerance: options.tolerance,
            accounts: HashMap::new(),
        }
    }

    fn significant(lexer: &mut Lexer<'source>) -> Token<'source> {
        loop {
            let token = lexer.next_token();
            if !token.is(TokenKind::Comment) {
                return token;
            }
        }
    }

    fn advance(&mut self) -> Token<'source> {
        let next = Self::significant(&mut self.lexer);
        let lookahead = std::mem::replace(&mut self.lookahead, next);
        std::mem::replace(&mut self.current, lookahead)
    }

    /// Whether the current line holds nothing but blanks (and comments).
    fn at_blank_indent(&self) -> bool {
        self.current.is(TokenKind::Indent)
            && matches!(self.lookahead.kind, TokenKind::NewLine | TokenKind::Eof)
    }

    fn skip_blank_lines(&mut self) {
        loop {
            if self.current.is(TokenKind::NewLine) {
                self.advance();
            } else if self.at_blank_indent() {
                self.advance();
            } else {
                return;
            }
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = &self.current;
        if token.is(TokenKind::Error) {
            Error::Lex {
                text: token.text.to_string(),
                location: token.location,
            }
        } else {
            Error::syntax(
                format!("expected {}, found {}", expected, token),
                token.location,
            )
        }
    }

    fn take(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'source>> {
        if self.current.is(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Consumes the newline ending a line. The last line of the input may
    /// end without one.
    fn take_line_end(&mut self, expected: &str) -> Result<()> {
        match self.current.kind {
            TokenKind::NewLine => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected(expected)),
        }
    }

    pub fn parse(mut self) -> Result<Vec<Transaction>> {
        let mut txns = Vec::new();
        self.skip_blank_lines();
        while !self.current.is(TokenKind::Eof) {
            txns.push(self.parse_txn()?);
            self.skip_blank_lines();
        }
        log::trace!("parsed {} transactions", txns.len());
        Ok(txns)
    }

    fn parse_date(&mut self) -> Result<Date> {
        let token = self.take(TokenKind::Date, "date")?;
        Date::parse_from_str(token.text, "%Y-%m-%d").map_err(|e| {
            Error::semantic(
                format!("invalid date {}: {}", token.text, e),
                Some(token.location),
            )
        })
    }

    fn parse_txn(&mut self) -> Result<Transaction> {
        let date = self.parse_date()?;
        let mut words = Vec::new();
        while self.current.is(TokenKind::Text) {
            words.push(self.advance().text);
        }
        if words.is_empty() {
            return Err(self.unexpected("description"));
        }
        let description = words.join(" ");
        if !self.current.is(TokenKind::NewLine) {
            return Err(self.unexpected("newline after description"));
        }
        self.advance();

        let mut postings = Vec::new();
        while self.current.is(TokenKind::Indent) {
            if self.at_blank_indent() {
                self.advance();
                self.take_line_end("newline")?;
                continue;
            }
            postings.push(self.parse_posting()?);
        }
        if postings.len() < 2 {
            return Err(Error::syntax(
                "transaction must have at least two postings",
                self.current.location,
            ));
        }

        let txn = Transaction::new(date, description, postings);
        txn.check_balance(self.tolerance, Some(self.current.location))?;
        Ok(txn)
    }

    fn parse_account(&mut self) -> Result<Account> {
        let token = self.take(TokenKind::Account, "account")?;
        let text = token.text;
        if !is_account_path(text) {
            return Err(Error::semantic(
                format!("invalid account path {:?}", text),
                Some(token.location),
            ));
        }
        let account = self
            .accounts
            .entry(text)
            .or_insert_with(|| Arc::new(text.to_string()))
            .clone();
        Ok(account)
    }

    fn parse_posting(&mut self) -> Result<Posting> {
        self.take(TokenKind::Indent, "indent")?;
        let account = self.parse_account()?;
        let token = self.take(TokenKind::Amount, "amount")?;
        let number = parse_amount(token.text).ok_or_else(|| {
            Error::semantic(
                format!("invalid amount {:?}", token.text),
                Some(token.location),
            )
        })?;
        self.take_line_end("newline after posting")?;
        Ok(Posting {
            account,
            amount: Amount::new(number, self.currency.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn grocery_store() {
        let txns = parse(
            "2024-01-15 Grocery Store\n  expenses:groceries  $45.32\n  assets:checking  -$45.32\n",
        )
        .unwrap();
        assert_eq!(txns.len(), 1);
        let txn = &txns[0];
        assert_eq!(txn.date(), Date::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(txn.description(), "Grocery Store");
        let postings: Vec<_> = txn
            .postings()
            .iter()
            .map(|p| (p.account.as_str(), p.amount.number))
            .collect();
        assert_eq!(
            postings,
            vec![
                ("expenses:groceries", dec("45.32")),
                ("assets:checking", dec("-45.32"))
            ]
        );
        assert_eq!(txn.postings()[0].amount.currency, "USD");
    }

    #[test]
    fn unbalanced_names_the_sum() {
        let err = parse("2024-01-15 Typo\n  expenses:food  $10.05\n  assets:cash  -$10\n")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorType::Semantic);
        assert!(err.to_string().contains("sum: 0.05"), "{}", err);
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let err = parse(
            "2024-01-01 X\n  a:b  70000000000000000000000000000\n  c:d  70000000000000000000000000000\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorType::Semantic);
        assert!(err.to_string().contains("amount overflow"), "{}", err);
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn empty_account_segments() {
        for (src, col) in [
            ("2024-01-01 X\n  assets:  $1\n  c:d  -$1\n", 2),
            ("2024-01-01 X\n  c:d  -$1\n    a::b  $1\n", 4),
        ] {
            let err = parse(src).unwrap_err();
            assert_eq!(err.kind(), ErrorType::Semantic);
            assert!(err.to_string().contains("invalid account path"), "{}", err);
            match err {
                Error::Semantic {
                    location: Some(location),
                    ..
                } => assert_eq!(location.col, col),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn within_tolerance_is_balanced() {
        assert!(parse("2024-01-15 Close\n  a:b  $10.01\n  c:d  -$10\n").is_ok());
    }

    #[test]
    fn one_space_is_not_a_posting() {
        let err = parse(
            "2024-01-15 Grocery Store\n expenses:groceries  $45.32\n  assets:checking  -$45.32\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorType::Syntax);
        assert!(
            err.to_string()
                .contains("transaction must have at least two postings"),
            "{}",
            err
        );
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn one_space_on_second_posting() {
        let err = parse("2024-01-15 Pay\n  a:b  $1\n c:d  -$1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Syntax);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn two_spaces_or_a_tab_pair_are_postings() {
        let txns = parse("2024-01-15 Pay\n\t\ta:b  $1\n  c:d  -$1\n").unwrap();
        assert_eq!(txns[0].postings().len(), 2);
    }

    #[test]
    fn blank_and_comment_lines() {
        let src = "; opening balances\n\n2024-01-01 Open ; first\n  assets:cash  $50\n  ; cash on hand\n   \n  equity:opening  -$50\n\n\n2024-01-02 Lunch\n  expenses:food  $5\n  assets:cash  -$5";
        let txns = parse(src).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].description(), "Open");
        assert_eq!(txns[0].postings().len(), 2);
        assert_eq!(txns[1].postings()[1].amount.number, dec("-5"));
    }

    #[test]
    fn shared_accounts_are_interned() {
        let txns = parse(
            "2024-01-01 A\n  assets:cash  $1\n  income:gift  -$1\n2024-01-02 B\n  assets:cash  $2\n  income:gift  -$2\n",
        )
        .unwrap();
        assert!(Arc::ptr_eq(
            &txns[0].postings()[0].account,
            &txns[1].postings()[0].account
        ));
    }

    #[test]
    fn missing_date() {
        let err = parse("Groceries\n  a:b  $1\n  c:d  -$1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Syntax);
        assert!(err.to_string().starts_with("line 1: expected date"));
    }

    #[test]
    fn invalid_calendar_date() {
        let err = parse("\n2024-02-30 Leap\n  a:b  $1\n  c:d  -$1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Semantic);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn missing_description() {
        let err = parse("2024-01-01\n  a:b  $1\n  c:d  -$1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Syntax);
        assert!(err.to_string().contains("expected description"));
    }

    #[test]
    fn amount_inside_description() {
        let err = parse("2024-01-01 Refund - store\n  a:b  $1\n  c:d  -$1\n").unwrap_err();
        assert!(err.to_string().contains("expected newline after description"));
    }

    #[test]
    fn invalid_amount() {
        let err = parse("2024-01-01 Odd\n  a:b  -\n  c:d  $0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Semantic);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn missing_amount() {
        let err = parse("2024-01-01 Odd\n  a:b\n  c:d  $0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Syntax);
        assert!(err.to_string().contains("expected amount, found newline"));
    }

    #[test]
    fn lex_error_is_reported() {
        let err = parse("2024-01-01 Odd\n  a:b \u{a0}\n").unwrap_err();
        assert_eq!(err.kind(), ErrorType::Lex);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn fail_fast_returns_no_partial_result() {
        let src = "2024-01-01 Good\n  a:b  $1\n  c:d  -$1\n\n2024-01-02 Bad\n  a:b  $1\n";
        assert!(parse(src).is_err());
    }

    #[test]
    fn currency_comes_from_options() {
        let options = Options {
            currency: "EUR".to_string(),
            ..Options::default()
        };
        let txns = Parser::new("2024-01-01 X\n  a:b  1\n  c:d  -1\n", &options)
            .parse()
            .unwrap();
        assert_eq!(txns[0].postings()[0].amount.currency, "EUR");
    }

    #[test]
    fn empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n  \n").unwrap().is_empty());
    }
}
