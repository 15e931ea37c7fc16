#![deny(missing_docs)]

//! Core library for the finsight bill analysis server.

/// Extraction and summarization pipeline shared by the HTTP surface.
pub mod analysis;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction from images (OCR) and PDFs.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Financial summary generation through a hosted language model.
pub mod summarization;
/// Uploaded file model and validation.
pub mod upload;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_support;
