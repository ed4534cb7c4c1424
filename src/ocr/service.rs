//! OCR Service
//!
//! Orchestrates OCR providers with ordered fallback.

use std::sync::Arc;

use super::provider::{OcrProvider, OllamaProvider};
use super::types::{OcrError, OcrResult};
use crate::config::OcrConfig;

/// OCR service for recognizing text in document images
pub struct OcrService {
    providers: Vec<Arc<dyn OcrProvider>>,
    language: String,
}

impl OcrService {
    /// Build the provider chain from configuration
    ///
    /// Tesseract (when compiled in) is preferred over Ollama.
    pub fn from_config(config: &OcrConfig) -> Self {
        let mut providers: Vec<Arc<dyn OcrProvider>> = Vec::new();

        #[cfg(feature = "ocr-tesseract")]
        {
            use super::provider::TesseractProvider;
            providers.push(Arc::new(TesseractProvider));
        }

        providers.push(Arc::new(OllamaProvider::new(
            &config.ollama_url,
            &config.ollama_model,
        )));

        Self {
            providers,
            language: config.language.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_providers(providers: Vec<Arc<dyn OcrProvider>>, language: &str) -> Self {
        Self {
            providers,
            language: language.to_string(),
        }
    }

    /// Perform OCR on an image, trying providers in order
    pub async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        for provider in &self.providers {
            if !provider.is_available().await {
                continue;
            }

            match provider.recognize(image_data, &self.language).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        backend = ?provider.backend(),
                        "OCR provider failed: {}, trying next",
                        e
                    );
                    continue;
                }
            }
        }

        Err(OcrError::ProviderNotAvailable(
            "No OCR providers available".to_string(),
        ))
    }
}
