use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a statement amount token like "1,234.56" into minor units.
/// Tokens come from the amount regexes, so they always carry exactly two
/// decimal places; anything else returns `None`.
pub(crate) fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    let dec = Decimal::from_str(&cleaned).ok()?;
    (dec * Decimal::from(100)).round().to_i64()
}

/// First `max` characters of a line, for warning messages.
pub(crate) fn excerpt(line: &str, max: usize) -> String {
    line.chars().take(max).collect()
}
