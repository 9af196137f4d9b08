//! Useful functions for parsing, formatting and storing ledgers.

use crate::Decimal;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Parses the text of an amount token, such as `-$45.32`, into a [`Decimal`].
///
/// Surrounding whitespace and the `$` glyph are ignored. A bare fractional
/// part (`.5`) and a trailing decimal point (`5.`) are accepted.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let text = text.trim().replace('$', "");
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    if digits.is_empty() || digits == "." {
        return None;
    }
    let number = if digits.starts_with('.') {
        format!("0{}", digits).parse::<Decimal>().ok()?
    } else {
        digits.parse::<Decimal>().ok()?
    };
    Some(if negative { -number } else { number })
}

/// Formats `number` with at least two fractional digits, keeping any extra
/// digits it already has.
pub fn format_number(number: Decimal) -> String {
    let mut number = number;
    if number.scale() < 2 {
        number.rescale(2);
    }
    number.to_string()
}

/// Formats a posting amount the way it is written in a ledger file: sign,
/// then `$`, then the number.
pub fn format_amount(number: Decimal) -> String {
    let text = format_number(number.abs());
    if number.is_sign_negative() && !number.is_zero() {
        format!("-${}", text)
    } else {
        format!("${}", text)
    }
}

/// Expands a leading `~/` to the home directory taken from `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Replaces `destination` with `contents` by writing a sibling temp file and
/// renaming it into place.
pub fn write_atomic(destination: &Path, contents: &str) -> io::Result<()> {
    let mut temp_name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = destination.with_file_name(temp_name);
    fs::write(&temp_path, contents)?;
    if let Err(initial_err) = fs::rename(&temp_path, destination) {
        // rename fails on some platforms when the destination exists
        let _ = fs::remove_file(destination);
        fs::rename(&temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(&temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_amount_strips_glyph_and_sign() {
        assert_eq!(parse_amount("$45.32"), Some(dec("45.32")));
        assert_eq!(parse_amount("-$45.32"), Some(dec("-45.32")));
        assert_eq!(parse_amount(" 12 "), Some(dec("12")));
        assert_eq!(parse_amount("-.5"), Some(dec("-0.5")));
        assert_eq!(parse_amount("7."), Some(dec("7")));
    }

    #[test]
    fn parse_amount_rejects_empty_numbers() {
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("-$."), None);
    }

    #[test]
    fn format_keeps_two_decimals_at_least() {
        assert_eq!(format_number(dec("3")), "3.00");
        assert_eq!(format_number(dec("3.5")), "3.50");
        assert_eq!(format_number(dec("3.125")), "3.125");
        assert_eq!(format_amount(dec("-45.32")), "-$45.32");
        assert_eq!(format_amount(dec("0")), "$0.00");
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("data.txt");
        fs::write(&dest, "old").unwrap();
        write_atomic(&dest, "new").unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        assert!(!dir.path().join("data.txt.tmp").exists());
    }
}
