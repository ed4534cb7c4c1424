//! Clinical Notes Server Library
//!
//! This crate exposes the server's building blocks for integration
//! testing. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `cache`: TTL listing cache with prefix invalidation
//! - `db`: SQLite persistence (patients, notes)
//! - `extract`: resilient text-extraction pipeline (PDF text layer → OCR)
//! - `ocr`: OCR provider chain
//! - `format`: external note-cleanup service client
//! - `routes`: HTTP surface

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod format;
pub mod ocr;
pub mod routes;
pub mod state;
