//! Item matcher: splits a candidate line into quantity, name and price.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use super::patterns::{CURRENCY_SYMBOLS, DECIMAL_DIGIT, ITEM_LINE};

/// Why a candidate line produced no item. Never fatal to the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line does not have the `[qty] name price` shape.
    #[error("no item pattern in line")]
    NoMatch,

    /// The price token is not a number once symbols are stripped.
    #[error("malformed price: {0}")]
    MalformedPrice(String),

    /// The quantity does not fit in a `u32`.
    #[error("malformed quantity: {0}")]
    MalformedQuantity(String),

    /// Quantity times price, or the running total, does not fit in a `Decimal`.
    #[error("amount overflow: {0}")]
    AmountOverflow(String),
}

/// Raw pieces of an item line, before noise filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMatch {
    /// Leading quantity, 1 when absent.
    pub quantity: u32,
    /// Trimmed product name.
    pub raw_name: String,
    /// Price token as it appeared in the line.
    pub raw_price: String,
    /// Parsed price.
    pub unit_price: Decimal,
}

/// Match the first `[qty [x]] name price` occurrence in a line.
pub fn match_line(line: &str) -> Result<ItemMatch, LineError> {
    let caps = ITEM_LINE.captures(line).ok_or(LineError::NoMatch)?;

    let quantity = match caps.get(1) {
        Some(m) => ascii_digits(m.as_str())
            .parse::<u32>()
            .map_err(|_| LineError::MalformedQuantity(m.as_str().to_string()))?,
        None => 1,
    };

    let raw_price = caps[3].to_string();
    let unit_price = parse_price(&raw_price)?;

    Ok(ItemMatch {
        quantity,
        raw_name: caps[2].trim().to_string(),
        raw_price,
        unit_price,
    })
}

/// Parse a price token such as `₹1,234.50`, `$5` or `10.`.
///
/// Currency symbols are stripped from the front and every comma is treated as
/// a thousands separator. Digits from any script are accepted.
pub fn parse_price(raw: &str) -> Result<Decimal, LineError> {
    let cleaned = ascii_digits(raw.trim_start_matches(CURRENCY_SYMBOLS)).replace(',', "");
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);

    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(LineError::MalformedPrice(raw.to_string()));
    }

    Decimal::from_str(cleaned).map_err(|_| LineError::MalformedPrice(raw.to_string()))
}

/// Rewrite decimal digits of any script (`٣`, `३`, `３`) as ASCII digits.
///
/// Unicode encodes each set of decimal digits as ten consecutive code points
/// starting at zero, so a digit's value is its offset from the start of its
/// run, modulo ten for adjacent runs.
pub fn ascii_digits(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_ascii() || !is_decimal_digit(c) {
                return c;
            }

            let mut start = c as u32;
            while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
                if !is_decimal_digit(prev) {
                    break;
                }
                start -= 1;
            }

            char::from(b'0' + ((c as u32 - start) % 10) as u8)
        })
        .collect()
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}
