//! Raw text acquisition from files.
//!
//! Failing to produce the text is the only fatal error in a run. Once a
//! string exists (even an empty one) extraction always succeeds.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{OcrError, Result, TallyError};
use crate::models::config::TallyConfig;
use crate::ocr::Recognizer;
use crate::pdf::PdfDocument;

/// Image extensions accepted for OCR.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Where the raw text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Plain text file.
    PlainText,
    /// Embedded PDF text.
    PdfText,
    /// OCR of an image embedded in a PDF page.
    PdfOcr,
    /// OCR of an image file.
    ImageOcr,
}

impl SourceKind {
    /// Stable lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::PlainText => "plain_text",
            SourceKind::PdfText => "pdf_text",
            SourceKind::PdfOcr => "pdf_ocr",
            SourceKind::ImageOcr => "image_ocr",
        }
    }
}

/// Raw document text plus its origin.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub text: String,
    pub kind: SourceKind,
}

/// Check whether a path has an extension [`TextLoader`] understands.
pub fn is_supported(path: &Path) -> bool {
    let ext = extension(path);
    ext == "txt" || ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Loads document text, keeping one OCR recognizer for every file it reads.
pub struct TextLoader {
    config: TallyConfig,
    recognizer: Recognizer,
}

impl TextLoader {
    pub fn new(config: &TallyConfig) -> Self {
        Self {
            config: config.clone(),
            recognizer: Recognizer::new(config.ocr.clone()),
        }
    }

    /// Load the raw text of a document.
    pub fn load(&self, path: &Path) -> Result<SourceText> {
        let ext = extension(path);
        info!("Loading {}", path.display());

        match ext.as_str() {
            "txt" => Ok(SourceText {
                text: std::fs::read_to_string(path)?,
                kind: SourceKind::PlainText,
            }),
            "pdf" => self.load_pdf(&std::fs::read(path)?),
            e if IMAGE_EXTENSIONS.contains(&e) => {
                let image = image::open(path)?;
                Ok(SourceText {
                    text: self.recognizer.recognize(&image)?,
                    kind: SourceKind::ImageOcr,
                })
            }
            _ => Err(TallyError::UnsupportedInput(format!(
                "unsupported file format: {}",
                path.display()
            ))),
        }
    }

    /// Read one PDF page: embedded text when there is enough, OCR otherwise.
    pub fn load_pdf(&self, data: &[u8]) -> Result<SourceText> {
        let document = PdfDocument::load(data)?;
        let pdf = &self.config.pdf;
        let page = pdf.page;

        let embedded = if pdf.prefer_embedded_text {
            document.page_text(page).unwrap_or_else(|e| {
                warn!("Embedded text extraction failed: {}", e);
                String::new()
            })
        } else {
            String::new()
        };

        if embedded.trim().len() >= pdf.min_text_length {
            debug!("Using {} chars of embedded text from page {}", embedded.len(), page);
            return Ok(SourceText {
                text: embedded,
                kind: SourceKind::PdfText,
            });
        }

        let images = document.page_images(page)?;
        let Some(image) = images.first() else {
            if !embedded.trim().is_empty() {
                warn!("No page image for OCR, using short embedded text");
                return Ok(SourceText {
                    text: embedded,
                    kind: SourceKind::PdfText,
                });
            }
            return Err(
                OcrError::InvalidImage(format!("no image found on PDF page {}", page)).into(),
            );
        };

        Ok(SourceText {
            text: self.recognizer.recognize(image)?,
            kind: SourceKind::PdfOcr,
        })
    }
}

/// Load the raw text of a single document.
pub fn load_text(path: &Path, config: &TallyConfig) -> Result<SourceText> {
    TextLoader::new(config).load(path)
}
