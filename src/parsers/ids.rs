//! IDS symbol tables: plain text, one `value symbol` pair per line. The first lines of a file are
//! usually a `IDS V1.0` header and an entry count, neither of which parses as an entry.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, hex_digit1, not_line_ending, space0, space1},
    combinator::{opt, recognize},
    error::{ErrorKind, ParseError},
    sequence::{pair, preceded},
    Err, IResult,
};

type Result<'a, T> = IResult<&'a str, T, IdsParseError>;

#[derive(Debug)]
pub enum IdsParseError {
    NomError {
        kind: ErrorKind,
        other: Option<Box<IdsParseError>>,
    },
    /// The value does not fit a 32-bit field.
    InvalidValue(String),
    MissingSymbol,
}

impl ParseError<&str> for IdsParseError {
    fn from_error_kind(_input: &str, kind: ErrorKind) -> Self {
        IdsParseError::NomError { kind, other: None }
    }

    fn append(_input: &str, kind: ErrorKind, other: Self) -> Self {
        IdsParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

fn hex_value(input: &str) -> Result<i64> {
    let (input, digits) = preceded(tag_no_case("0x"), hex_digit1)(input)?;
    match u32::from_str_radix(digits, 16) {
        Ok(v) => Ok((input, i64::from(v))),
        Err(_) => Err(Err::Failure(IdsParseError::InvalidValue(digits.to_owned()))),
    }
}

fn dec_value(input: &str) -> Result<i64> {
    let (input, digits) = recognize(pair(opt(tag_no_case("-")), digit1))(input)?;
    match digits.parse::<i32>() {
        Ok(v) => Ok((input, i64::from(v))),
        Err(_) => Err(Err::Failure(IdsParseError::InvalidValue(digits.to_owned()))),
    }
}

/// Parses a single `value symbol` line.
pub fn entry(line: &str) -> Result<(i64, String)> {
    let (input, _) = space0(line)?;
    let (input, value) = alt((hex_value, dec_value))(input)?;
    let (input, _) = space1(input)?;
    let (input, symbol) = not_line_ending(input)?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(Err::Error(IdsParseError::MissingSymbol));
    }
    Ok((input, (value, symbol.to_owned())))
}

/// Every entry of `text` in file order. Lines that are not entries are skipped.
pub fn entries(text: &str) -> Vec<(i64, String)> {
    text.lines()
        .filter_map(|line| match entry(line) {
            Ok((_, pair)) => Some(pair),
            Err(e) => {
                if !line.trim().is_empty() {
                    log::trace!("skipping IDS line {:?}: {:?}", line, e);
                }
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_hex_and_negative_values() {
        assert_eq!(entry("12 FIREBALL").unwrap().1, (12, "FIREBALL".to_owned()));
        assert_eq!(entry("0x4001 ARROW_EXP").unwrap().1, (0x4001, "ARROW_EXP".to_owned()));
        assert_eq!(entry("  -1 NONE  ").unwrap().1, (-1, "NONE".to_owned()));
    }

    #[test]
    fn symbols_may_contain_spaces() {
        assert_eq!(
            entry("3\tLong Sword").unwrap().1,
            (3, "Long Sword".to_owned())
        );
    }

    #[test]
    fn skips_headers_and_bad_lines() {
        let text = "IDS V1.0\n3\n0 NONE\n\n1 ARROW\nfoo bar\n0xFFFFFFFFF HUGE\n2 BOLT\n";
        assert_eq!(
            entries(text),
            vec![
                (0, "NONE".to_owned()),
                (1, "ARROW".to_owned()),
                (2, "BOLT".to_owned()),
            ]
        );
    }

    #[test]
    fn bare_value_is_not_an_entry() {
        assert!(entry("42").is_err());
        assert!(entry("42   ").is_err());
    }
}
