//! Document processing: extraction and summarization joined into one result.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::extract::{ExtractionStats, LineItemExtractor};
use crate::models::table::ItemTable;
use crate::summary::Summarizer;

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    /// Narrative summary or a placeholder when the summarizer was unavailable.
    pub summary: String,
    /// Extracted item table.
    pub table: ItemTable,
    /// Line counters from extraction.
    pub stats: ExtractionStats,
    /// When processing finished.
    pub processed_at: DateTime<Utc>,
    /// Wall time in milliseconds.
    pub processing_time_ms: u64,
}

/// Runs extraction and summarization for a document's raw text.
///
/// Holds no per-document state, so one processor can serve many documents
/// concurrently.
pub struct DocumentProcessor<S> {
    extractor: LineItemExtractor,
    summarizer: S,
}

impl<S: Summarizer> DocumentProcessor<S> {
    /// Create a processor around a summarizer.
    pub fn new(summarizer: S) -> Self {
        Self {
            extractor: LineItemExtractor::new(),
            summarizer,
        }
    }

    /// Process raw OCR text.
    ///
    /// The summary request runs concurrently with extraction; the two are
    /// joined only to assemble the result.
    pub async fn process(&self, text: &str) -> ProcessedDocument {
        let start = Instant::now();

        info!("Processing document from {} characters of text", text.len());

        let extraction = async { self.extractor.extract(text) };
        let (report, summary) = tokio::join!(extraction, self.summarizer.summarize(text));

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} rows in {}ms",
            report.table.len(),
            processing_time_ms
        );

        ProcessedDocument {
            summary,
            table: report.table,
            stats: report.stats,
            processed_at: Utc::now(),
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{DisabledSummarizer, StaticSummarizer};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_process_joins_summary_and_table() {
        let processor = DocumentProcessor::new(StaticSummarizer::new("A widget order."));
        let doc = processor.process("3 x Widget 10.00").await;

        assert_eq!(doc.summary, "A widget order.");
        assert_eq!(doc.table.len(), 2);
        assert_eq!(
            doc.table.grand_total().net_amount,
            Decimal::from_str("30.00").unwrap()
        );
        assert_eq!(doc.stats.accepted, 1);
    }

    #[tokio::test]
    async fn test_process_empty_text() {
        let processor = DocumentProcessor::new(DisabledSummarizer);
        let doc = processor.process("").await;

        assert!(doc.table.has_no_items());
        assert_eq!(doc.summary, crate::summary::DISABLED_MESSAGE);
    }

    #[tokio::test]
    async fn test_concurrent_documents_are_independent() {
        let processor = DocumentProcessor::new(DisabledSummarizer);
        let (a, b) = tokio::join!(
            processor.process("Widget 10.00"),
            processor.process("Gadget 2.00\nGizmo 3.00")
        );

        assert_eq!(a.table.len(), 2);
        assert_eq!(b.table.len(), 3);
        assert_eq!(a.table.body()[0].product_name, "Widget");
    }

    #[test]
    fn test_document_serializes_table_under_rows() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let doc = rt.block_on(DocumentProcessor::new(DisabledSummarizer).process("Widget 10.00"));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["table"][0]["Product Name"], "Widget");
        assert_eq!(json["table"][1]["Product Name"], "Grand Total");
        assert_eq!(json["stats"]["accepted"], 1);
    }
}
