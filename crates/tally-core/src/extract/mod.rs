//! Line-item extraction from OCR text.
//!
//! Each trimmed, non-empty line goes through the classifier, then the
//! matcher, then the noise filter. Survivors become [`LineItem`]s and the
//! aggregator closes the table with a grand total. Nothing in here fails:
//! unusable lines are dropped and an empty result degrades to a placeholder row.

pub mod aggregate;
pub mod classifier;
pub mod matcher;
pub mod noise;
pub mod patterns;

pub use aggregate::build_table;
pub use classifier::{LineClass, classify_line};
pub use matcher::{ItemMatch, LineError, match_line, parse_price};
pub use noise::{NoiseReason, is_noise};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

use crate::models::table::{ItemTable, LineItem};

/// Per-run counters describing what happened to each line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    /// Trimmed, non-empty lines.
    pub candidate_lines: usize,
    /// Lines classified as metadata.
    pub skipped_lines: usize,
    /// Lines without an item pattern.
    pub unmatched_lines: usize,
    /// Lines whose price or quantity could not be parsed, or whose amount
    /// overflowed.
    pub malformed_lines: usize,
    /// Matches rejected by the noise filter.
    pub noise_rejected: usize,
    /// Accepted line items.
    pub accepted: usize,
}

/// Extraction output: the table plus counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Final item table.
    pub table: ItemTable,
    /// Line counters.
    pub stats: ExtractionStats,
}

/// Stateless line-item extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract accepted line items in the order they appear.
    pub fn extract_items(&self, text: &str) -> Vec<LineItem> {
        self.run(text).0
    }

    /// Extract the complete item table with counters.
    pub fn extract(&self, text: &str) -> ExtractionReport {
        let (items, stats) = self.run(text);

        debug!(
            "Extracted {} items from {} candidate lines ({} skipped, {} unmatched, {} malformed, {} noise)",
            stats.accepted,
            stats.candidate_lines,
            stats.skipped_lines,
            stats.unmatched_lines,
            stats.malformed_lines,
            stats.noise_rejected
        );

        ExtractionReport {
            table: build_table(items),
            stats,
        }
    }

    fn run(&self, text: &str) -> (Vec<LineItem>, ExtractionStats) {
        let mut stats = ExtractionStats::default();
        let mut items = Vec::new();
        let mut total = Decimal::ZERO;

        for line in text.split(is_line_break).map(str::trim).filter(|l| !l.is_empty()) {
            stats.candidate_lines += 1;

            if classify_line(line) == LineClass::Skip {
                trace!("skip (metadata): {:?}", line);
                stats.skipped_lines += 1;
                continue;
            }

            let m = match match_line(line) {
                Ok(m) => m,
                Err(LineError::NoMatch) => {
                    trace!("skip (no match): {:?}", line);
                    stats.unmatched_lines += 1;
                    continue;
                }
                Err(e) => {
                    trace!("skip ({}): {:?}", e, line);
                    stats.malformed_lines += 1;
                    continue;
                }
            };

            if let Some(reason) = is_noise(&m.raw_name) {
                trace!("skip (noise {:?}): {:?}", reason, m.raw_name);
                stats.noise_rejected += 1;
                continue;
            }

            let Some(item) = LineItem::new(m.raw_name, m.quantity, m.unit_price)
                .filter(|item| total.checked_add(item.net_amount()).is_some())
            else {
                let e = LineError::AmountOverflow(m.raw_price);
                trace!("skip ({}): {:?}", e, line);
                stats.malformed_lines += 1;
                continue;
            };

            total += item.net_amount();
            items.push(item);
        }

        stats.accepted = items.len();
        (items, stats)
    }
}

// Line boundaries: `\n`, `\r`, vertical tab, form feed (OCR page breaks),
// file/group/record separators, NEL and the Unicode line/paragraph separators.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Extract the item table from raw OCR text.
pub fn extract_table(text: &str) -> ItemTable {
    LineItemExtractor::new().extract(text).table
}
