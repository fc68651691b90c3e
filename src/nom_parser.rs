//! Argument grammars.
//!
//! Numeric arguments are parsed leniently: the longest numeric prefix is
//! used and anything after it is ignored, an argument without one reads as 0.
//! Booleans are strict.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit0, digit1, one_of, space0};
use nom::combinator::{all_consuming, opt, recognize, value};
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;

/// Parse the integer prefix of `arg`, 0 if there is none. Saturates on overflow.
pub(crate) fn int_prefix(arg: &str) -> i32 {
    match preceded(space0, integer)(arg) {
        Ok((_rest, digits)) => digits.parse().unwrap_or(if digits.starts_with('-') {
            i32::MIN
        } else {
            i32::MAX
        }),
        Err(_) => 0,
    }
}

/// Parse the floating point prefix of `arg`, 0.0 if there is none.
pub(crate) fn float_prefix(arg: &str) -> f32 {
    match preceded(space0, float)(arg) {
        Ok((_rest, digits)) => digits.parse().unwrap_or(0.0),
        Err(_) => 0.0,
    }
}

/// Parse exactly `TRUE` or `FALSE`.
pub(crate) fn bool_literal(arg: &str) -> Option<bool> {
    let parsed: IResult<&str, bool> =
        all_consuming(alt((value(true, tag("TRUE")), value(false, tag("FALSE")))))(arg);
    parsed.ok().map(|(_, b)| b)
}

fn sign(buf: &str) -> IResult<&str, Option<char>> {
    opt(one_of("+-"))(buf)
}

fn integer(buf: &str) -> IResult<&str, &str> {
    recognize(pair(sign, digit1))(buf)
}

fn float(buf: &str) -> IResult<&str, &str> {
    recognize(tuple((
        sign,
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), sign, digit1))),
    )))(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefix() {
        assert_eq!(int_prefix("1000"), 1000);
        assert_eq!(int_prefix("  -12"), -12);
        assert_eq!(int_prefix("+7"), 7);
        assert_eq!(int_prefix("42abc"), 42);
        assert_eq!(int_prefix("12.9"), 12);
        assert_eq!(int_prefix("abc"), 0);
        assert_eq!(int_prefix(""), 0);
        assert_eq!(int_prefix("-"), 0);
        assert_eq!(int_prefix("99999999999"), i32::MAX);
        assert_eq!(int_prefix("-99999999999"), i32::MIN);
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(float_prefix("12.5"), 12.5);
        assert_eq!(float_prefix("-0.25V"), -0.25);
        assert_eq!(float_prefix(".5"), 0.5);
        assert_eq!(float_prefix("3."), 3.0);
        assert_eq!(float_prefix("1e3"), 1000.0);
        assert_eq!(float_prefix("2e"), 2.0);
        assert_eq!(float_prefix("x1"), 0.0);
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(bool_literal("TRUE"), Some(true));
        assert_eq!(bool_literal("FALSE"), Some(false));
        assert_eq!(bool_literal("true"), None);
        assert_eq!(bool_literal("TRUEX"), None);
        assert_eq!(bool_literal("MAYBE"), None);
    }
}
