//! Line classifier: separates document metadata from candidate item lines.

use super::patterns::{ITEM_LINE, METADATA_KEYWORDS};

/// Classification of a single candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Header or metadata; not evaluated further.
    Skip,
    /// Passed on to the item matcher.
    Consider,
}

/// Classify a trimmed line.
///
/// A line is skipped only when it mentions a metadata keyword *and* does not
/// look like a priced item, so "Total Widgets 5 120.00" is still considered.
pub fn classify_line(line: &str) -> LineClass {
    if METADATA_KEYWORDS.is_match(line) && !ITEM_LINE.is_match(line) {
        LineClass::Skip
    } else {
        LineClass::Consider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_without_price_is_skipped() {
        assert_eq!(classify_line("Invoice Date: 2024-01-01"), LineClass::Skip);
        assert_eq!(classify_line("GSTIN: 29ABCDE"), LineClass::Skip);
        assert_eq!(classify_line("BALANCE DUE"), LineClass::Skip);
    }

    #[test]
    fn test_keyword_with_item_shape_is_considered() {
        assert_eq!(classify_line("Total Widgets 5 120.00"), LineClass::Consider);
        assert_eq!(classify_line("Total 120.00"), LineClass::Consider);
    }

    #[test]
    fn test_keyword_is_substring_match() {
        // "update" contains "date"
        assert_eq!(classify_line("update pending"), LineClass::Skip);
        assert_eq!(classify_line("Statement"), LineClass::Skip);
    }

    #[test]
    fn test_lines_without_keywords_are_considered() {
        assert_eq!(classify_line("Widget 10.00"), LineClass::Consider);
        // No item shape either; the matcher drops it later.
        assert_eq!(classify_line("Thank you for shopping"), LineClass::Consider);
    }
}
