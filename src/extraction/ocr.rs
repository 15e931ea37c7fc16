//! Tesseract OCR engine.
//!
//! The image is re-encoded as PNG into a temporary file and handed to the Tesseract
//! command-line binary, which prints recognized text on stdout.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

/// Errors raised by OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR binary could not be found or started.
    #[error("OCR engine not available: {0}")]
    BackendNotAvailable(String),
    /// The OCR binary ran but reported a failure.
    #[error("OCR failed: {0}")]
    OcrFailed(String),
    /// Writing the intermediate image failed.
    #[error("OCR I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Turns a decoded image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text contained in `image`. An image without text yields an empty string.
    async fn recognize(&self, image: DynamicImage) -> Result<String, OcrError>;
}

/// OCR engine backed by the Tesseract command-line binary.
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    /// Build an engine running `binary` with the given language pack.
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    fn write_temp_png(image: &DynamicImage) -> Result<NamedTempFile, OcrError> {
        let mut file = tempfile::Builder::new()
            .prefix("finsight-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .write_to(file.as_file_mut(), ImageFormat::Png)
            .map_err(|error| OcrError::OcrFailed(format!("failed to encode image: {error}")))?;
        Ok(file)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: DynamicImage) -> Result<String, OcrError> {
        let temp = tokio::task::spawn_blocking(move || Self::write_temp_png(&image))
            .await
            .map_err(|error| OcrError::OcrFailed(format!("image encoder crashed: {error}")))??;

        tracing::debug!(binary = %self.binary.display(), language = %self.language, "Running tesseract");
        let output = Command::new(&self.binary)
            .arg(temp.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(format!(
                    "{} not found (install tesseract-ocr or set TESSERACT_PATH)",
                    self.binary.display()
                )))
            }
            Err(error) => Err(OcrError::Io(error)),
        }
    }
}
