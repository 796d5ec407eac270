//! Core library for invoice line-item extraction.
//!
//! This crate provides:
//! - Line-item extraction from noisy OCR text (classifier, matcher, noise filter, aggregator)
//! - Table export (JSON, CSV, plain text)
//! - Document text sources (plain text, PDF, OCR of images)
//! - A remote summarizer boundary that never fails the run

pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod source;
pub mod summary;

pub use error::{Result, TallyError};
pub use export::{TableFormat, write_table};
pub use extract::{ExtractionReport, ExtractionStats, LineItemExtractor, extract_table};
pub use models::config::TallyConfig;
pub use models::table::{ItemTable, LineItem, TableRow};
pub use pdf::PdfDocument;
pub use pipeline::{DocumentProcessor, ProcessedDocument};
pub use source::{SourceKind, SourceText, TextLoader, load_text};
pub use summary::{
    ConfiguredSummarizer, DisabledSummarizer, GeminiSummarizer, StaticSummarizer, Summarizer,
};
