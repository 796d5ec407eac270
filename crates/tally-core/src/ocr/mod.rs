//! OCR boundary: image in, plain multi-line text out.
//!
//! The recognizer is a black box. Its output goes to extraction untouched
//! apart from line ordering.

#[cfg(feature = "native")]
mod engine;
mod preprocessing;

#[cfg(feature = "native")]
pub use engine::OcrEngine;
pub use preprocessing::binarize;

#[cfg(feature = "native")]
use std::sync::Mutex;

use image::DynamicImage;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// A recognized text fragment with its axis-aligned box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Recognized text.
    pub text: String,
    /// Bounding box (min_x, min_y, max_x, max_y).
    pub rect: (f32, f32, f32, f32),
    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// Sort fragments top-to-bottom, left-to-right and join them with newlines.
///
/// Fragments whose tops fall in the same 20px band are treated as one row.
pub fn join_reading_order(mut fragments: Vec<TextFragment>) -> String {
    fragments.sort_by(|a, b| {
        let row_a = (a.rect.1 / 20.0) as i32;
        let row_b = (b.rect.1 / 20.0) as i32;
        row_a
            .cmp(&row_b)
            .then(a.rect.0.partial_cmp(&b.rect.0).unwrap_or(std::cmp::Ordering::Equal))
    });

    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prepare an image for recognition according to config.
pub fn prepare_image(image: &DynamicImage, config: &OcrConfig) -> DynamicImage {
    if config.binarize {
        DynamicImage::ImageLuma8(binarize(
            image,
            config.threshold_block_size,
            config.threshold_offset,
        ))
    } else {
        image.clone()
    }
}

/// Image-to-text recognizer shared across documents.
///
/// The models are loaded on the first image and kept for the rest of the run.
/// A failed load is not cached, so a later call retries.
pub struct Recognizer {
    config: OcrConfig,
    #[cfg(feature = "native")]
    engine: Mutex<Option<OcrEngine>>,
}

impl Recognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "native")]
            engine: Mutex::new(None),
        }
    }

    /// Whether the models have been loaded.
    #[cfg(feature = "native")]
    pub fn is_loaded(&self) -> bool {
        self.engine.lock().is_ok_and(|slot| slot.is_some())
    }

    #[cfg(not(feature = "native"))]
    pub fn is_loaded(&self) -> bool {
        false
    }

    /// Recognize the text of an image.
    #[cfg(feature = "native")]
    pub fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let prepared = prepare_image(image, &self.config);

        let mut slot = self
            .engine
            .lock()
            .map_err(|_| OcrError::Recognition("OCR engine lock poisoned".to_string()))?;
        let engine = match &mut *slot {
            Some(engine) => engine,
            empty => empty.insert(OcrEngine::from_config(&self.config)?),
        };

        engine.recognize(&prepared)
    }

    #[cfg(not(feature = "native"))]
    pub fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Err(OcrError::Unavailable)
    }
}
