//! Pure decoders for single attribute values.
//!
//! Each function takes the raw (already comma/quote-stripped) string for one
//! attribute and returns either a typed value or a documented sentinel.
//! Malformed non-empty input is reported through [`crate::diagnostics`]; a
//! missing (`None`) input never warns.

use crate::diagnostics::{self, DISCARDED_HEX, DISCARDED_ISO8601};
use chrono::{DateTime, FixedOffset};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, hex_digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{pair, preceded, separated_pair, tuple},
    IResult,
};

/// `"YES"` → `true`, anything else (including `"NO"` and empty input) → `false`.
pub fn parse_bool(value: &str) -> bool {
    value == "YES"
}

fn dec_digits(i: &str) -> IResult<&str, &str> {
    alt((tag("0"), recognize(pair(one_of("123456789"), digit0))))(i)
}

fn decimal_integer(i: &str) -> IResult<&str, u64> {
    map_res(dec_digits, str::parse)(i)
}

/// Decimal, non-negative integer. `None` on malformed or missing input; the
/// caller supplies the field-specific default (`0` for most numeric fields).
pub fn parse_integer(value: Option<&str>) -> Option<u64> {
    let value = value?;
    all_consuming(decimal_integer)(value).ok().map(|(_, n)| n)
}

fn decimal_float(i: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((opt(char('-')), opt(dec_digits), char('.'), digit1))),
        str::parse,
    )(i)
}

fn decimal_float_or_integer(i: &str) -> IResult<&str, f64> {
    alt((decimal_float, map_res(dec_digits, |s: &str| s.parse())))(i)
}

/// Decimal float (an integer literal is also accepted). `0.0` on malformed
/// or missing input.
pub fn parse_float(value: Option<&str>) -> f64 {
    value
        .and_then(|v| all_consuming(decimal_float_or_integer)(v).ok())
        .map(|(_, f)| f)
        .unwrap_or(0.0)
}

fn hex_sequence(i: &str) -> IResult<&str, &str> {
    preceded(alt((tag("0x"), tag("0X"))), hex_digit1)(i)
}

/// `0[xX][0-9a-fA-F]+`, decoded big-endian and left-padded to an even
/// nibble count (`"0xdeadbee"`, 7 nibbles, decodes to `0d ea db ee`).
/// `None` (with a warning) on malformed non-empty input; `None` without a
/// warning when `value` is `None`.
pub fn parse_hex(value: Option<&str>) -> Option<Vec<u8>> {
    let value = value?;
    let Ok((_, digits)) = all_consuming(hex_sequence)(value) else {
        diagnostics::warn(DISCARDED_HEX);
        return None;
    };

    let padded = if digits.len() % 2 == 1 {
        let mut s = String::with_capacity(digits.len() + 1);
        s.push('0');
        s.push_str(digits);
        s
    } else {
        digits.to_string()
    };

    hex::decode(padded).ok()
}

/// `YYYY-MM-DDTHH:MM:SS[.fff]Z|±HH:MM`; the timezone is mandatory. `None`
/// (with a warning) for malformed non-empty input, including a date-only
/// string. `None` without a warning when `value` is `None`.
pub fn parse_iso8601(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt),
        Err(_) => {
            diagnostics::warn(DISCARDED_ISO8601);
            None
        }
    }
}

/// Float seconds (may be negative). `None` input stays `None`; no sentinel
/// substitution happens here because every caller of `timedelta` treats
/// absence as "field not present", not "field present but malformed".
pub fn parse_timedelta(value: Option<&str>) -> Option<f64> {
    let value = value?;
    all_consuming(decimal_float_or_integer)(value)
        .ok()
        .map(|(_, f)| f)
}

/// `<width>x<height>` in decimal. `(0, 0)` on malformed or empty input.
pub fn parse_resolution(value: &str) -> (u64, u64) {
    all_consuming(separated_pair(decimal_integer, char('x'), decimal_integer))(value)
        .map(|(_, pair)| pair)
        .unwrap_or((0, 0))
}

/// `<length>` or `<length>@<offset>`. `None` on malformed or empty input.
pub fn parse_byterange(value: &str) -> Option<(u64, Option<u64>)> {
    fn with_offset(i: &str) -> IResult<&str, (u64, Option<u64>)> {
        let (i, (length, offset)) = separated_pair(decimal_integer, char('@'), decimal_integer)(i)?;
        Ok((i, (length, Some(offset))))
    }

    fn without_offset(i: &str) -> IResult<&str, (u64, Option<u64>)> {
        let (i, length) = decimal_integer(i)?;
        Ok((i, (length, None)))
    }

    all_consuming(alt((with_offset, without_offset)))(value)
        .ok()
        .map(|(_, v)| v)
}

/// `<duration>[,<title>]`. `(0.0, None)` when `duration` is absent or
/// malformed, matching `EXTINF`'s own lenient handling of bad producers.
pub fn parse_extinf(value: &str) -> (f64, Option<String>) {
    let mut parts = value.splitn(2, ',');
    let duration = parts
        .next()
        .and_then(|d| all_consuming(decimal_float_or_integer)(d).ok())
        .map(|(_, f)| f)
        .unwrap_or(0.0);
    let title = parts.next().filter(|t| !t.is_empty()).map(str::to_owned);
    (duration, title)
}
