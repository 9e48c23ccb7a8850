//! OCR of the flame stat boxes.
//!
//! This module provides:
//! - The `OcrEngine` seam used by the reroll loop
//! - A Tesseract CLI engine with upscaling preprocessing
//! - Placeholder text for degraded and simulated runs
//! - `FallbackOcr`, which substitutes placeholder text when the real engine fails

pub mod engine;
pub mod placeholder;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractOcr;
pub use placeholder::PlaceholderOcr;

use image::RgbaImage;
use std::path::PathBuf;
use thiserror::Error;

use crate::analysis::TextSource;

/// Errors raised by OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Tesseract not found (searched: {searched})")]
    EngineMissing { searched: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Tesseract failed: {0}")]
    EngineFailed(String),
    #[error("failed to prepare OCR input: {0}")]
    Input(String),
}

/// Raw text read from one capture, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrText {
    pub text: String,
    pub source: TextSource,
}

impl OcrText {
    pub fn ocr(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TextSource::Ocr,
        }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TextSource::Placeholder,
        }
    }
}

/// Turns a captured bitmap into raw text.
pub trait OcrEngine {
    fn recognize(&self, image: &RgbaImage) -> Result<OcrText, OcrError>;
}

/// Wraps a real engine and substitutes placeholder text when it fails.
///
/// Substituted readings carry `TextSource::Placeholder` so the decision
/// engine and the report can flag them.
pub struct FallbackOcr<E> {
    primary: E,
    fallback: PlaceholderOcr,
}

impl<E: OcrEngine> FallbackOcr<E> {
    pub fn new(primary: E) -> Self {
        Self {
            primary,
            fallback: PlaceholderOcr::new(),
        }
    }
}

impl<E: OcrEngine> OcrEngine for FallbackOcr<E> {
    fn recognize(&self, image: &RgbaImage) -> Result<OcrText, OcrError> {
        match self.primary.recognize(image) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!("OCR failed ({}), substituting placeholder text", e);
                self.fallback.recognize(image)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl OcrEngine for Broken {
        fn recognize(&self, _image: &RgbaImage) -> Result<OcrText, OcrError> {
            Err(OcrError::EngineFailed("boom".to_string()))
        }
    }

    struct Fixed;

    impl OcrEngine for Fixed {
        fn recognize(&self, _image: &RgbaImage) -> Result<OcrText, OcrError> {
            Ok(OcrText::ocr("STR: +9"))
        }
    }

    #[test]
    fn test_fallback_flags_placeholder_text() {
        let ocr = FallbackOcr::new(Broken);
        let text = ocr.recognize(&RgbaImage::new(1, 1)).unwrap();
        assert_eq!(text.source, TextSource::Placeholder);
        assert!(!text.text.is_empty());
    }

    #[test]
    fn test_fallback_passes_real_text_through() {
        let ocr = FallbackOcr::new(Fixed);
        let text = ocr.recognize(&RgbaImage::new(1, 1)).unwrap();
        assert_eq!(text, OcrText::ocr("STR: +9"));
    }
}
