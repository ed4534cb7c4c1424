//! OCR Module
//!
//! Optical character recognition for uploaded clinical documents.
//!
//! Supports multiple backends:
//! - Tesseract (local, requires installation, `ocr-tesseract` feature)
//! - Ollama vision models (local LLM)
//!
//! The service tries configured providers in order and falls back to
//! the next one when a provider fails or is unavailable.

mod provider;
mod service;
mod types;

pub use provider::{OcrProvider, OllamaProvider};
pub use service::OcrService;
pub use types::{OcrBackend, OcrError, OcrResult};

#[cfg(feature = "ocr-tesseract")]
pub use provider::TesseractProvider;

#[cfg(test)]
pub use provider::MockProvider;
