//! Noise filter: rejects matches whose names are not plausible products.
//!
//! OCR output is full of header fragments, codes and totals that still fit
//! the loose item pattern. These surface-form checks trade recall for
//! precision. They will also reject legitimate all-caps brand names.

use super::patterns::{CODE_LIKE, NOISE_TOKENS};

/// Minimum product name length in characters.
pub const MIN_NAME_LEN: usize = 3;

/// Why a matched name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseReason {
    /// Fewer than three characters.
    TooShort,
    /// A known filler token such as "total" or "-".
    NoiseToken,
    /// Uppercase letters and digits only, four or more (SKU, serial).
    CodeLike,
    /// All-caps alphabetic word longer than three characters.
    ShoutedHeader,
}

/// Check a trimmed product name. Returns the first reason that applies.
pub fn is_noise(name: &str) -> Option<NoiseReason> {
    let len = name.chars().count();

    if len < MIN_NAME_LEN {
        return Some(NoiseReason::TooShort);
    }

    if NOISE_TOKENS.contains(&name.to_lowercase().as_str()) {
        return Some(NoiseReason::NoiseToken);
    }

    if CODE_LIKE.is_match(name) {
        return Some(NoiseReason::CodeLike);
    }

    if len > 3 && is_all_caps_word(name) {
        return Some(NoiseReason::ShoutedHeader);
    }

    None
}

// Alphabetic only, at least one uppercase letter and no lowercase ones.
fn is_all_caps_word(name: &str) -> bool {
    name.chars().all(char::is_alphabetic)
        && name.chars().any(char::is_uppercase)
        && !name.chars().any(char::is_lowercase)
}
