//! Text extraction from uploaded bills: OCR for images, text layers for PDFs.

pub mod ocr;
pub mod pdf;

use crate::config::Config;
use ocr::{OcrEngine, TesseractOcr};
use thiserror::Error;

/// Errors produced while extracting text from an upload.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The media type has no extraction path.
    #[error("Unsupported file format.")]
    UnsupportedFormat {
        /// Media type that was declared for the file.
        media_type: String,
    },
    /// Decoding, parsing, or OCR failed.
    #[error("Error extracting text: {0}")]
    Failed(String),
}

/// Dispatches uploads to the image OCR or PDF extraction path based on media type.
pub struct TextExtractor {
    ocr: Box<dyn OcrEngine>,
}

impl TextExtractor {
    /// Build an extractor around the given OCR engine.
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// Build an extractor using Tesseract as configured.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Box::new(TesseractOcr::new(
            &config.tesseract_path,
            &config.ocr_language,
        )))
    }

    /// Extract text from `content`, interpreted according to `media_type`.
    ///
    /// `image/*` content is decoded and run through OCR; `application/pdf` content has each
    /// page's text extracted and joined with a single space. The result may be empty.
    pub async fn extract(
        &self,
        content: Vec<u8>,
        media_type: &str,
    ) -> Result<String, ExtractionError> {
        if media_type.starts_with("image") {
            self.extract_image(content).await
        } else if media_type == "application/pdf" {
            Self::extract_pdf(content).await
        } else {
            Err(ExtractionError::UnsupportedFormat {
                media_type: media_type.to_string(),
            })
        }
    }

    async fn extract_image(&self, content: Vec<u8>) -> Result<String, ExtractionError> {
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&content))
            .await
            .map_err(|error| ExtractionError::Failed(error.to_string()))?
            .map_err(|error| ExtractionError::Failed(error.to_string()))?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "Decoded image for OCR"
        );
        self.ocr
            .recognize(image)
            .await
            .map_err(|error| ExtractionError::Failed(error.to_string()))
    }

    async fn extract_pdf(content: Vec<u8>) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed documents; the join error catches those.
        tokio::task::spawn_blocking(move || pdf::extract_text(&content))
            .await
            .map_err(|error| ExtractionError::Failed(error.to_string()))?
            .map_err(|error| ExtractionError::Failed(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pdf_with_pages;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use ocr::OcrError;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct StubOcr {
        text: String,
        seen: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    #[async_trait]
    impl OcrEngine for StubOcr {
        async fn recognize(&self, image: DynamicImage) -> Result<String, OcrError> {
            self.seen
                .lock()
                .expect("lock")
                .push((image.width(), image.height()));
            Ok(self.text.clone())
        }
    }

    struct FailingOcr;

    #[async_trait]
    impl OcrEngine for FailingOcr {
        async fn recognize(&self, _image: DynamicImage) -> Result<String, OcrError> {
            Err(OcrError::OcrFailed("engine exploded".into()))
        }
    }

    fn stub_extractor(text: &str) -> (TextExtractor, Arc<Mutex<Vec<(u32, u32)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let extractor = TextExtractor::new(Box::new(StubOcr {
            text: text.into(),
            seen: seen.clone(),
        }));
        (extractor, seen)
    }

    fn encoded_image(format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(8, 6));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).expect("encode image");
        buffer.into_inner()
    }

    #[tokio::test]
    async fn png_and_jpeg_are_decoded_and_sent_to_ocr() {
        let (extractor, seen) = stub_extractor("Subtotal 42.00");

        for (format, mime) in [
            (ImageFormat::Png, "image/png"),
            (ImageFormat::Jpeg, "image/jpeg"),
        ] {
            let text = extractor
                .extract(encoded_image(format), mime)
                .await
                .expect("text");
            assert_eq!(text, "Subtotal 42.00");
        }

        assert_eq!(*seen.lock().expect("lock"), vec![(8, 6), (8, 6)]);
    }

    #[tokio::test]
    async fn image_without_text_yields_empty_string() {
        let (extractor, _) = stub_extractor("");
        let text = extractor
            .extract(encoded_image(ImageFormat::Png), "image/png")
            .await
            .expect("text");
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn undecodable_image_is_an_extraction_failure() {
        let (extractor, seen) = stub_extractor("never");
        let error = extractor
            .extract(b"not really a png".to_vec(), "image/png")
            .await
            .expect_err("decode failure");

        assert!(matches!(error, ExtractionError::Failed(_)));
        assert!(error.to_string().starts_with("Error extracting text: "));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn ocr_failure_carries_original_message() {
        let extractor = TextExtractor::new(Box::new(FailingOcr));
        let error = extractor
            .extract(encoded_image(ImageFormat::Png), "image/png")
            .await
            .expect_err("ocr failure");
        assert_eq!(
            error.to_string(),
            "Error extracting text: OCR failed: engine exploded"
        );
    }

    #[tokio::test]
    async fn pdf_pages_are_space_joined() {
        let (extractor, seen) = stub_extractor("unused");
        let pdf = pdf_with_pages(&["Total: $10", "Tax: $2"]);

        let text = extractor
            .extract(pdf.clone(), "application/pdf")
            .await
            .expect("text");

        assert_eq!(text, pdf::extract_pages(&pdf).expect("pages").join(" "));
        assert!(text.contains("Total: $10"));
        assert!(text.find("Total").expect("total") < text.find("Tax").expect("tax"));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn corrupt_pdf_is_an_extraction_failure() {
        let (extractor, _) = stub_extractor("unused");
        let error = extractor
            .extract(b"%PDF-1.5 truncated".to_vec(), "application/pdf")
            .await
            .expect_err("parse failure");
        assert!(matches!(error, ExtractionError::Failed(_)));
    }

    #[tokio::test]
    async fn other_media_types_are_unsupported() {
        let (extractor, _) = stub_extractor("unused");
        for mime in ["text/plain", "application/zip", "video/mp4"] {
            let error = extractor
                .extract(b"data".to_vec(), mime)
                .await
                .expect_err("unsupported");
            assert!(
                matches!(&error, ExtractionError::UnsupportedFormat { media_type } if media_type == mime)
            );
            assert_eq!(error.to_string(), "Unsupported file format.");
        }
    }
}
