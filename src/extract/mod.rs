//! Resilient text-extraction pipeline
//!
//! Converts an uploaded clinical document (PDF or image) into plain
//! text through an ordered chain of extraction strategies. Each
//! strategy either yields text, signals "nothing usable, try the next
//! one", or fails hard when no fallback remains:
//!
//! 1. PDF structural text extraction (text layer)
//! 2. Rasterize + OCR (first page only for PDFs; raw bytes for images)
//!
//! The first non-empty trimmed result wins. An exhausted chain yields
//! an empty string, which the upload handler treats as total failure.

pub mod pdf;

use std::sync::Arc;

use async_trait::async_trait;

use crate::ocr::{OcrError, OcrService};

/// MIME-derived document family
///
/// Only PDFs and images are recognized; everything else is rejected
/// before extraction is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime == "application/pdf" {
            Some(Self::Pdf)
        } else if mime.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }
}

/// An uploaded document: a byte buffer plus its declared type
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

impl UploadedDocument {
    pub fn new(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        Self { bytes, kind }
    }
}

/// Extraction pipeline errors
///
/// These only surface where no fallback stage remains; a recoverable
/// stage failure is absorbed by the stage itself.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to extract text from PDF")]
    EmptyRasterization,

    #[error("PDF processing failed: {0}")]
    Pdf(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// One stage of the extraction chain
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy applies to the given document family
    fn handles(&self, kind: DocumentKind) -> bool;

    /// Attempt extraction. `Ok(None)` means "nothing usable here, try
    /// the next strategy"; `Err` aborts the chain.
    async fn extract(&self, doc: &UploadedDocument) -> Result<Option<String>, ExtractError>;
}

/// Ordered chain of extraction strategies
pub struct TextExtractor {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl TextExtractor {
    /// Build the standard chain: PDF text layer, then raster OCR
    pub fn new(ocr: Arc<OcrService>) -> Self {
        Self {
            strategies: vec![Arc::new(PdfTextLayer), Arc::new(RasterOcr::new(ocr))],
        }
    }

    pub fn with_strategies(strategies: Vec<Arc<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the applicable strategies in order
    ///
    /// Returns the first non-empty trimmed text, or an empty string
    /// when every applicable strategy came up dry.
    pub async fn extract(&self, doc: &UploadedDocument) -> Result<String, ExtractError> {
        for strategy in self.strategies.iter().filter(|s| s.handles(doc.kind)) {
            match strategy.extract(doc).await? {
                Some(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        tracing::debug!(strategy = strategy.name(), "Extraction produced text");
                        return Ok(trimmed.to_string());
                    }
                    tracing::debug!(strategy = strategy.name(), "Extraction empty, trying next");
                }
                None => {
                    tracing::debug!(strategy = strategy.name(), "Nothing usable, trying next");
                }
            }
        }

        Ok(String::new())
    }
}

/// Structural text extraction from a PDF's embedded text layer
///
/// Failures here are recoverable (OCR remains), so they map to
/// "try the next strategy" rather than aborting the upload.
pub struct PdfTextLayer;

#[async_trait]
impl ExtractionStrategy for PdfTextLayer {
    fn name(&self) -> &'static str {
        "pdf-text-layer"
    }

    fn handles(&self, kind: DocumentKind) -> bool {
        kind == DocumentKind::Pdf
    }

    async fn extract(&self, doc: &UploadedDocument) -> Result<Option<String>, ExtractError> {
        match pdf::extract_text(doc.bytes.clone()).await {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!("PDF text layer extraction failed: {}, falling back to OCR", e);
                Ok(None)
            }
        }
    }
}

/// OCR over the raster form of the document
///
/// For PDFs, only the first page is rasterized. This is the last
/// stage, so its failures propagate.
pub struct RasterOcr {
    ocr: Arc<OcrService>,
}

impl RasterOcr {
    pub fn new(ocr: Arc<OcrService>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl ExtractionStrategy for RasterOcr {
    fn name(&self) -> &'static str {
        "raster-ocr"
    }

    fn handles(&self, _kind: DocumentKind) -> bool {
        true
    }

    async fn extract(&self, doc: &UploadedDocument) -> Result<Option<String>, ExtractError> {
        let image = match doc.kind {
            DocumentKind::Image => doc.bytes.clone(),
            DocumentKind::Pdf => {
                let raster =
                    pdf::rasterize_first_page(doc.bytes.clone(), pdf::RASTER_SCALE).await?;
                if raster.is_empty() {
                    return Err(ExtractError::EmptyRasterization);
                }
                raster
            }
        };

        let result = self.ocr.recognize(&image).await?;
        Ok(Some(result.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStrategy {
        kind: Option<DocumentKind>,
        result: Result<Option<String>, String>,
        calls: AtomicUsize,
    }

    impl FixedStrategy {
        fn yielding(text: &str) -> Self {
            Self {
                kind: None,
                result: Ok(Some(text.to_string())),
                calls: AtomicUsize::new(0),
            }
        }

        fn empty_handed() -> Self {
            Self {
                kind: None,
                result: Ok(None),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                kind: None,
                result: Err(msg.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn only_for(mut self, kind: DocumentKind) -> Self {
            self.kind = Some(kind);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtractionStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn handles(&self, kind: DocumentKind) -> bool {
            self.kind.map_or(true, |k| k == kind)
        }

        async fn extract(
            &self,
            _doc: &UploadedDocument,
        ) -> Result<Option<String>, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(ExtractError::Pdf(msg.clone())),
            }
        }
    }

    fn pdf_doc() -> UploadedDocument {
        UploadedDocument::new(b"%PDF-1.4".to_vec(), DocumentKind::Pdf)
    }

    #[test]
    fn test_mime_dispatch() {
        assert_eq!(
            DocumentKind::from_mime("application/pdf"),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_mime("image/png"),
            Some(DocumentKind::Image)
        );
        assert_eq!(
            DocumentKind::from_mime("image/jpeg"),
            Some(DocumentKind::Image)
        );
        assert_eq!(DocumentKind::from_mime("text/plain"), None);
        assert_eq!(DocumentKind::from_mime("application/msword"), None);
    }

    #[tokio::test]
    async fn test_first_non_empty_text_wins() {
        let first = Arc::new(FixedStrategy::yielding("  first  "));
        let second = Arc::new(FixedStrategy::yielding("second"));
        let extractor =
            TextExtractor::with_strategies(vec![first.clone(), second.clone()]);

        let text = extractor.extract(&pdf_doc()).await.unwrap();
        assert_eq!(text, "first");
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_none_falls_through_to_next_strategy() {
        let first = Arc::new(FixedStrategy::empty_handed());
        let second = Arc::new(FixedStrategy::yielding("recovered"));
        let extractor = TextExtractor::with_strategies(vec![first, second]);

        let text = extractor.extract(&pdf_doc()).await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn test_whitespace_only_falls_through() {
        let first = Arc::new(FixedStrategy::yielding("   \n\t "));
        let second = Arc::new(FixedStrategy::yielding("real text"));
        let extractor = TextExtractor::with_strategies(vec![first, second]);

        let text = extractor.extract(&pdf_doc()).await.unwrap();
        assert_eq!(text, "real text");
    }

    #[tokio::test]
    async fn test_exhausted_chain_yields_empty_string() {
        let extractor = TextExtractor::with_strategies(vec![
            Arc::new(FixedStrategy::empty_handed()),
            Arc::new(FixedStrategy::yielding("")),
        ]);

        let text = extractor.extract(&pdf_doc()).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_strategy_error_propagates() {
        let extractor = TextExtractor::with_strategies(vec![
            Arc::new(FixedStrategy::failing("raster exploded")),
            Arc::new(FixedStrategy::yielding("never reached")),
        ]);

        let result = extractor.extract(&pdf_doc()).await;
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[tokio::test]
    async fn test_inapplicable_strategy_is_skipped() {
        let pdf_only = Arc::new(FixedStrategy::yielding("pdf text").only_for(DocumentKind::Pdf));
        let extractor = TextExtractor::with_strategies(vec![pdf_only.clone()]);

        let image = UploadedDocument::new(vec![0xFF, 0xD8], DocumentKind::Image);
        let text = extractor.extract(&image).await.unwrap();

        assert!(text.is_empty());
        assert_eq!(pdf_only.call_count(), 0);
    }
}
