//! OCR engine backed by `pure-onnx-ocr` (pure Rust, no external runtime).

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::{TextFragment, join_reading_order};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Detection + recognition engine loaded from a model directory.
pub struct OcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl OcrEngine {
    /// Load the detection, recognition and dictionary files named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let (det_path, rec_path, dict_path) = config.model_paths();

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded OCR engine from {}", config.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }

    /// Recognize text fragments in an image.
    pub fn fragments(&self, image: &DynamicImage) -> Result<Vec<TextFragment>, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::InvalidImage("empty image".to_string()));
        }

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        Ok(results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextFragment {
                    text,
                    rect: polygon_rect(&r.bounding_box),
                    confidence: r.confidence,
                }
            })
            .collect())
    }

    /// Recognize an image and return its text in reading order.
    pub fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let fragments = self.fragments(image)?;

        let mean_confidence = if fragments.is_empty() {
            0.0
        } else {
            fragments.iter().map(|f| f.confidence).sum::<f32>() / fragments.len() as f32
        };
        debug!(
            "OCR found {} text regions in {}ms (mean confidence {:.2})",
            fragments.len(),
            start.elapsed().as_millis(),
            mean_confidence
        );

        Ok(join_reading_order(fragments))
    }
}

// Axis-aligned bounds of the detected quadrilateral.
fn polygon_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32, f32) {
    let mut rect = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for coord in polygon.exterior().coords().take(4) {
        let (x, y) = (coord.x as f32, coord.y as f32);
        rect.0 = rect.0.min(x);
        rect.1 = rect.1.min(y);
        rect.2 = rect.2.max(x);
        rect.3 = rect.3.max(y);
    }
    rect
}
