pub mod engine;
pub mod pdfium;
pub mod reader;
pub mod types;

pub use engine::*;
pub use pdfium::*;
pub use reader::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file extension for OCR: {0}")]
    UnsupportedFormat(String),

    #[error("OCR engine initialization failed: {0}")]
    EngineInit(String),

    #[error("OCR recognition failed: {0}")]
    Recognition(String),

    #[error("PDF rendering failed on page {page}: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),
}
