//! PDF text and image extraction.
//!
//! Only one page is read per document. Embedded text is preferred; scanned
//! pages yield their images for OCR.

mod document;

pub use document::PdfDocument;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
