//! Application state management

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::cache::ListingCache;
use crate::config::Config;
use crate::db::{Note, Page, Patient};
use crate::extract::TextExtractor;
use crate::format::NoteFormatter;
use crate::ocr::OcrService;

/// TTL for the listing caches (one day)
pub const LISTING_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    patients_cache: ListingCache<Page<Patient>>,
    notes_cache: ListingCache<Page<Note>>,
    extractor: TextExtractor,
    formatter: NoteFormatter,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let ocr = Arc::new(OcrService::from_config(&config.ocr));
        let extractor = TextExtractor::new(ocr);
        let formatter = NoteFormatter::new(&config.formatter);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                patients_cache: ListingCache::new(LISTING_CACHE_TTL),
                notes_cache: ListingCache::new(LISTING_CACHE_TTL),
                extractor,
                formatter,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the patient listing cache
    pub fn patients_cache(&self) -> &ListingCache<Page<Patient>> {
        &self.inner.patients_cache
    }

    /// Get the note listing cache
    pub fn notes_cache(&self) -> &ListingCache<Page<Note>> {
        &self.inner.notes_cache
    }

    /// Get the text-extraction pipeline
    pub fn extractor(&self) -> &TextExtractor {
        &self.inner.extractor
    }

    /// Get the note formatter
    pub fn formatter(&self) -> &NoteFormatter {
        &self.inner.formatter
    }
}
