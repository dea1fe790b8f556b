//! # Duration Strings
//!
//! Parses durations written the way most network tools accept them on the
//! command line: a sequence of decimal numbers, each with an optional fraction
//! and a unit suffix.
//!
//! * `"300ms"`, `"1.5s"`, `"2m"`, `"1h2m3s"`, `"250us"`
//! * `"0"` is the only value allowed without a unit.
//!
//! Negative values are rejected, durations are never allowed to run backwards.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,
    #[error("duration must not be negative")]
    Negative,
    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),
    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },
    #[error("invalid duration '{0}'")]
    Invalid(String),
    #[error("duration '{0}' is too large")]
    Overflow(String),
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_in_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a duration string such as `"1s"` or `"1m30s"`.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    let mut rest = match trimmed.as_bytes().first() {
        None => return Err(DurationError::Empty),
        Some(b'-') => {
            // "-0" is still zero, anything else runs backwards.
            let tail = &trimmed[1..];
            return match parse(tail) {
                Ok(d) if d.is_zero() => Ok(d),
                Ok(_) => Err(DurationError::Negative),
                Err(e) => Err(e),
            };
        }
        Some(b'+') => &trimmed[1..],
        Some(_) => trimmed,
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, frac, after_number) = split_number(rest, input)?;

        let unit_len = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let unit = &after_number[..unit_len];
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_in_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;
        if !frac.is_empty() {
            let digits: u128 = frac.parse().map_err(|_| overflow())?;
            let divisor = 10u128.checked_pow(frac.len() as u32).ok_or_else(overflow)?;
            value = value
                .checked_add(digits.checked_mul(scale).ok_or_else(overflow)? / divisor)
                .ok_or_else(overflow)?;
        }
        total = total.checked_add(value).ok_or_else(overflow)?;
        rest = &after_number[unit_len..];
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Splits the leading `123.45` off `s`, returning the whole part, the raw
/// fraction digits and the remainder.
fn split_number<'a>(s: &'a str, input: &str) -> Result<(u128, &'a str, &'a str), DurationError> {
    let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (int_part, after_int) = s.split_at(int_len);

    let (frac_part, after_number) = match after_int.strip_prefix('.') {
        Some(tail) => {
            let frac_len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
            tail.split_at(frac_len)
        }
        None => ("", after_int),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| DurationError::Overflow(input.to_string()))?
    };

    // Anything past nanosecond precision is dropped.
    let frac_part = &frac_part[..frac_part.len().min(18)];
    Ok((whole, frac_part, after_number))
}
