use std::path::Path;

use super::types::{OcrEngine, OcrPage, OcrResult, OcrWord, PdfPageRenderer, RecognizedPage};
use super::OcrError;

/// Rasterization resolution for paginated documents. Fixed trade-off between
/// recognition accuracy and processing cost; not configurable.
pub const RENDER_DPI: u32 = 220;

/// Drives recognition for one file: detects the file kind, rasterizes
/// paginated documents page by page, and assembles the immutable
/// [`OcrResult`].
pub struct OcrReader {
    engine: Box<dyn OcrEngine + Send + Sync>,
    pdf: Box<dyn PdfPageRenderer + Send + Sync>,
}

impl OcrReader {
    pub fn new(
        engine: Box<dyn OcrEngine + Send + Sync>,
        pdf: Box<dyn PdfPageRenderer + Send + Sync>,
    ) -> Self {
        Self { engine, pdf }
    }

    /// Recognize a file into an [`OcrResult`].
    ///
    /// Raster images (png/jpg/jpeg) become a single page; PDFs are rendered
    /// page by page at [`RENDER_DPI`]. Any other extension fails with
    /// [`OcrError::UnsupportedFormat`] — no partial result is returned.
    pub fn run_ocr(&self, file_path: &Path) -> Result<OcrResult, OcrError> {
        let extension = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "png" | "jpg" | "jpeg" => {
                let bytes = std::fs::read(file_path)?;
                let page = self.engine.recognize(&bytes)?;
                tracing::debug!(
                    path = %file_path.display(),
                    words = page.words.len(),
                    "Recognized raster image"
                );
                Ok(OcrResult::from_pages(vec![number_page(page, 1)]))
            }
            "pdf" => {
                let bytes = std::fs::read(file_path)?;
                let page_count = self.pdf.page_count(&bytes)?;

                let mut pages = Vec::with_capacity(page_count);
                for index in 0..page_count {
                    let png = self.pdf.render_page(&bytes, index, RENDER_DPI)?;
                    let page = self.engine.recognize(&png)?;
                    pages.push(number_page(page, index as u32 + 1));
                }

                tracing::debug!(
                    path = %file_path.display(),
                    pages = page_count,
                    "Recognized paginated document"
                );
                Ok(OcrResult::from_pages(pages))
            }
            _ => Err(OcrError::UnsupportedFormat(extension)),
        }
    }
}

fn number_page(page: RecognizedPage, page_number: u32) -> OcrPage {
    let words = page
        .words
        .into_iter()
        .map(|w| OcrWord {
            text: w.text,
            confidence: w.confidence,
            bbox: w.bbox,
            page_number,
        })
        .collect();
    OcrPage {
        page_number,
        text: page.text,
        words,
    }
}
