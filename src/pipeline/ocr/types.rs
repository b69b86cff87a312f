use serde::{Deserialize, Serialize};

use super::OcrError;

/// Pixel-space rectangle locating a recognized word on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One recognized word with its position and engine confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    /// Normalized to [0, 1]. Engine "no confidence" rows come through as 0.
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
    pub page_number: u32,
}

/// One page of recognized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// Full recognition output for one document. Produced once per pipeline run
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub full_text: String,
    pub pages: Vec<OcrPage>,
}

impl OcrResult {
    /// Assemble from per-page results: full_text joins non-empty page texts
    /// with a newline.
    pub fn from_pages(pages: Vec<OcrPage>) -> Self {
        let full_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Self { full_text, pages }
    }
}

/// Raw per-page output from a recognition engine, before the reader assigns
/// page numbers.
#[derive(Debug, Clone)]
pub struct RecognizedPage {
    pub text: String,
    pub words: Vec<RecognizedWord>,
}

#[derive(Debug, Clone)]
pub struct RecognizedWord {
    pub text: String,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

/// Recognition engine abstraction (allows mocking for tests).
pub trait OcrEngine {
    fn recognize(&self, image_bytes: &[u8]) -> Result<RecognizedPage, OcrError>;
}

/// PDF page rasterization abstraction.
pub trait PdfPageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, OcrError>;

    /// Render one zero-indexed page to PNG bytes at the given DPI.
    fn render_page(&self, pdf_bytes: &[u8], page_number: usize, dpi: u32)
        -> Result<Vec<u8>, OcrError>;
}

/// Scale a raw engine confidence (0..100, negative sentinel for "none") into
/// the [0, 1] range used everywhere downstream.
pub fn normalize_engine_confidence(raw: f32) -> f32 {
    if raw < 0.0 {
        0.0
    } else {
        (raw / 100.0).clamp(0.0, 1.0)
    }
}
