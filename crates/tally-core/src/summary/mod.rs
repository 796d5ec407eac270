//! Free-text invoice summaries from a remote language model.
//!
//! A summarizer never fails: transport, auth and timeout problems are turned
//! into a readable placeholder so extraction results are always delivered.

mod gemini;

pub use gemini::GeminiSummarizer;

use std::future::Future;

use thiserror::Error;
use tracing::warn;

use crate::models::config::SummaryConfig;

/// Instruction placed in front of the raw text.
pub const SUMMARY_PREFIX: &str = "Summarize this invoice:";

/// Returned when no API key is available.
pub const MISSING_KEY_MESSAGE: &str = "Summary unavailable: API key not configured.";

/// Returned by [`DisabledSummarizer`].
pub const DISABLED_MESSAGE: &str = "Summary disabled.";

/// Errors that can occur while requesting a summary.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// No API key was configured.
    #[error("API key not configured")]
    MissingApiKey,

    /// Network or HTTP client error.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response did not contain generated text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request exceeded its time budget.
    #[error("timed out after {0}s")]
    Timeout(u64),
}

impl SummaryError {
    /// Placeholder text shown instead of a summary.
    pub fn fallback_message(&self) -> String {
        match self {
            SummaryError::MissingApiKey => MISSING_KEY_MESSAGE.to_string(),
            other => format!("Summary unavailable: {}", other),
        }
    }
}

/// Build the summarization prompt for a document.
pub fn summary_prompt(text: &str) -> String {
    format!("{}\n{}", SUMMARY_PREFIX, text)
}

/// Produces a narrative summary of invoice text.
pub trait Summarizer {
    /// Summarize the raw document text. Failures become placeholder strings.
    fn summarize(&self, text: &str) -> impl Future<Output = String> + Send;
}

/// Summarizer used when summaries are turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _text: &str) -> String {
        DISABLED_MESSAGE.to_string()
    }
}

/// Summarizer returning a fixed response, for tests and offline runs.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    response: String,
}

impl StaticSummarizer {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Summarizer for StaticSummarizer {
    async fn summarize(&self, _text: &str) -> String {
        self.response.clone()
    }
}

/// Summarizer selected from configuration.
pub enum ConfiguredSummarizer {
    /// Summaries turned off.
    Disabled(DisabledSummarizer),
    /// Remote Gemini summaries.
    Gemini(GeminiSummarizer),
    /// The client could not be constructed; every call returns this message.
    Unavailable(String),
}

impl ConfiguredSummarizer {
    /// Pick a summarizer for `config`. Never fails.
    pub fn from_config(config: &SummaryConfig) -> Self {
        if !config.enabled {
            return Self::Disabled(DisabledSummarizer);
        }

        match GeminiSummarizer::new(config) {
            Ok(summarizer) => Self::Gemini(summarizer),
            Err(e) => {
                warn!("Could not create summarizer client: {}", e);
                Self::Unavailable(e.fallback_message())
            }
        }
    }
}

impl Summarizer for ConfiguredSummarizer {
    async fn summarize(&self, text: &str) -> String {
        match self {
            Self::Disabled(s) => s.summarize(text).await,
            Self::Gemini(s) => s.summarize(text).await,
            Self::Unavailable(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_prompt() {
        assert_eq!(
            summary_prompt("Widget 10.00\nTotal 10.00"),
            "Summarize this invoice:\nWidget 10.00\nTotal 10.00"
        );
        assert_eq!(summary_prompt(""), "Summarize this invoice:\n");
    }

    #[test]
    fn test_fallback_messages() {
        assert_eq!(
            SummaryError::MissingApiKey.fallback_message(),
            MISSING_KEY_MESSAGE
        );
        assert_eq!(
            SummaryError::Timeout(30).fallback_message(),
            "Summary unavailable: timed out after 30s"
        );
        assert_eq!(
            SummaryError::Status {
                status: 403,
                body: "forbidden".to_string()
            }
            .fallback_message(),
            "Summary unavailable: HTTP 403: forbidden"
        );
    }

    #[tokio::test]
    async fn test_configured_summarizer() {
        let disabled = SummaryConfig {
            enabled: false,
            ..SummaryConfig::default()
        };
        let summarizer = ConfiguredSummarizer::from_config(&disabled);
        assert!(matches!(summarizer, ConfiguredSummarizer::Disabled(_)));
        assert_eq!(summarizer.summarize("x").await, DISABLED_MESSAGE);

        let no_key = SummaryConfig {
            api_key: None,
            ..SummaryConfig::default()
        };
        let summarizer = ConfiguredSummarizer::from_config(&no_key);
        assert!(matches!(summarizer, ConfiguredSummarizer::Gemini(_)));
        assert_eq!(summarizer.summarize("x").await, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_simple_summarizers() {
        assert_eq!(DisabledSummarizer.summarize("x").await, DISABLED_MESSAGE);
        assert_eq!(
            StaticSummarizer::new("Two items, 35.00 total.")
                .summarize("x")
                .await,
            "Two items, 35.00 total."
        );
    }
}
