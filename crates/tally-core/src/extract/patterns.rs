//! Regex patterns shared by the line classifier, matcher and noise filter.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Metadata keywords (substring match, any case)
    pub static ref METADATA_KEYWORDS: Regex = Regex::new(
        r"(?i)(invoice|date|gst|state|city|total|tax|amount|vendor|balance|code)"
    ).unwrap();

    // [qty [x|×|*]] name price
    pub static ref ITEM_LINE: Regex = Regex::new(
        r"(?i)(?:(\d+)\s*[x×*]?\s*)?([A-Za-z][A-Za-z0-9\s\-&]*)\s+([₹$]?\d+[.,]?\d*)"
    ).unwrap();

    // One Unicode decimal digit (general category Nd)
    pub static ref DECIMAL_DIGIT: Regex = Regex::new(
        r"^\d$"
    ).unwrap();

    // SKU / serial number shaped names (case-sensitive)
    pub static ref CODE_LIKE: Regex = Regex::new(
        r"^[A-Z0-9]{4,}$"
    ).unwrap();
}

/// Lowercased names that are never products.
pub const NOISE_TOKENS: &[&str] = &["%", "-", "x", "state", "total", "invoice", "amount", "code"];

/// Currency glyphs stripped from the front of a price token.
pub const CURRENCY_SYMBOLS: &[char] = &['₹', '$'];
