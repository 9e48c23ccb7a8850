use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{OcrEngine, OcrError, OcrText};

/// Fixed flame readings returned in place of real OCR output.
pub const PLACEHOLDER_TEXTS: [&str; 5] = [
    "STR: +9\nDEX: +18\nWeapon Attack: +3\nCP Increase: -120\n",
    "STR: +27\nAll Stats: +4%\nMax HP: +600\nCP Increase: -35\n",
    "DEX: +36\nWeapon Attack: +5\nSpeed: +6\nCP Increase: -80\n",
    "STR: +45\nAll Stats: +5%\nWeapon Attack: +6\nCP Increase: +210\n",
    "INT: +18\nLUK: +27\nMagic Attack: +4\nCP Increase: -12\n",
];

/// Cycles through [`PLACEHOLDER_TEXTS`] in order, one per call.
///
/// Deterministic so simulated runs are reproducible.
#[derive(Debug, Default)]
pub struct PlaceholderOcr {
    next: AtomicUsize,
}

impl PlaceholderOcr {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OcrEngine for PlaceholderOcr {
    fn recognize(&self, _image: &RgbaImage) -> Result<OcrText, OcrError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % PLACEHOLDER_TEXTS.len();
        Ok(OcrText::placeholder(PLACEHOLDER_TEXTS[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TextSource;

    #[test]
    fn test_cycles_in_order() {
        let ocr = PlaceholderOcr::new();
        let img = RgbaImage::new(1, 1);
        let texts: Vec<_> = (0..PLACEHOLDER_TEXTS.len() + 1)
            .map(|_| ocr.recognize(&img).unwrap())
            .collect();
        assert_eq!(texts[0].text, PLACEHOLDER_TEXTS[0]);
        assert_eq!(texts[1].text, PLACEHOLDER_TEXTS[1]);
        assert_eq!(texts[PLACEHOLDER_TEXTS.len()].text, PLACEHOLDER_TEXTS[0]);
        assert!(texts.iter().all(|t| t.source == TextSource::Placeholder));
    }
}
