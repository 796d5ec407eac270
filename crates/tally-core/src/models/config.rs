//! Configuration structures for the tally pipeline.
//!
//! Tool locations and credentials live here and are handed to the boundary
//! collaborators when they are constructed. The extraction core never reads
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TallyError;

/// Environment variable consulted for the summarizer API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration for the tally pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Summarizer configuration.
    pub summary: SummaryConfig,

    /// Table export configuration.
    pub export: ExportConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Binarize images before recognition.
    pub binarize: bool,

    /// Side length of the adaptive threshold window (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,

    /// Keep `[UNK]` markers emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            binarize: true,
            threshold_block_size: 31,
            threshold_offset: 2,
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Full paths to (detection, recognition, dictionary) files.
    pub fn model_paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.model_dir.join(&self.detection_model),
            self.model_dir.join(&self.recognition_model),
            self.model_dir.join(&self.dictionary),
        )
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Page to read (1-indexed). Only one page is processed per document.
    pub page: u32,

    /// Try embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length to skip OCR.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page: 1,
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// Remote summarizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Request a summary at all.
    pub enabled: bool,

    /// API key. Falls back to `GEMINI_API_KEY` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the generative language API.
    pub endpoint: String,

    /// Model name.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SummaryConfig {
    /// Fill in the API key from the environment if the config has none.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }
}

/// Table export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Name of the single table section in exported files.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Line_Items".to_string(),
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        let block = self.ocr.threshold_block_size;
        if block < 3 || block % 2 == 0 {
            return Err(TallyError::Config(format!(
                "ocr.threshold_block_size must be odd and at least 3, got {}",
                block
            )));
        }
        if self.pdf.page == 0 {
            return Err(TallyError::Config("pdf.page is 1-indexed".to_string()));
        }
        if self.summary.timeout_secs == 0 {
            return Err(TallyError::Config(
                "summary.timeout_secs must be positive".to_string(),
            ));
        }
        if self.export.sheet_name.trim().is_empty() {
            return Err(TallyError::Config(
                "export.sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TallyConfig =
            serde_json::from_str(r#"{ "summary": { "timeout_secs": 5 } }"#).unwrap();

        assert_eq!(config.summary.timeout_secs, 5);
        assert_eq!(config.summary.model, "gemini-1.5-flash");
        assert_eq!(config.pdf.page, 1);
        assert_eq!(config.export.sheet_name, "Line_Items");
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = TallyConfig::default();
        config.ocr.binarize = false;
        config.save(&path).unwrap();

        let loaded = TallyConfig::from_file(&path).unwrap();
        assert!(!loaded.ocr.binarize);
        assert_eq!(loaded.ocr.threshold_block_size, 31);
    }

    #[test]
    fn test_validate() {
        assert!(TallyConfig::default().validate().is_ok());

        let mut config = TallyConfig::default();
        config.ocr.threshold_block_size = 30;
        assert!(matches!(config.validate(), Err(TallyError::Config(_))));

        let mut config = TallyConfig::default();
        config.pdf.page = 0;
        assert!(matches!(config.validate(), Err(TallyError::Config(_))));

        let mut config = TallyConfig::default();
        config.export.sheet_name = " ".to_string();
        assert!(matches!(config.validate(), Err(TallyError::Config(_))));
    }

    #[test]
    fn test_configured_api_key_is_kept() {
        let config = SummaryConfig {
            api_key: Some("from-file".to_string()),
            ..SummaryConfig::default()
        }
        .with_env_api_key();

        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }
}
