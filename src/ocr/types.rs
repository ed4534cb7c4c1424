//! OCR Types

use serde::{Deserialize, Serialize};

/// OCR backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Tesseract OCR (local)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

/// Recognized text from one image
///
/// The contract is binary: trimmed text, possibly empty when the image
/// holds nothing recognizable. No confidence score is modeled.
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub backend: OcrBackend,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("OCR processing failed: {0}")]
    Processing(String),

    #[error("OCR API error: {0}")]
    Api(String),
}
