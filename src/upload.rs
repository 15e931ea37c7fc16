//! Uploaded file model and validation rules for the analysis endpoint.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted upload, in bytes (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Name of the multipart form field carrying the upload.
pub const UPLOAD_FIELD: &str = "file";

pub(crate) const MSG_NO_FILE: &str = "No file was submitted.";
pub(crate) const MSG_NOT_A_FILE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";
const MSG_EMPTY: &str = "The submitted file is empty.";
const MSG_UNSUPPORTED: &str = "Unsupported file format. Only JPEG, PNG, or PDF allowed.";
const MSG_TOO_LARGE: &str = "File size exceeds 5MB.";

/// Media types accepted by the analysis endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `application/pdf`
    Pdf,
}

impl MediaType {
    /// Canonical MIME string for this media type.
    pub const fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

impl FromStr for MediaType {
    type Err = ();

    /// Parameters such as `; charset=binary` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "application/pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

/// A file received through the analysis endpoint. Lives for a single request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// File name declared by the client.
    pub file_name: String,
    /// Media type declared by the client, as sent.
    pub content_type: String,
    /// Raw bytes received. Reading stops once the size limit is exceeded.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Number of bytes received.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Declared media type, if it is one of the accepted ones.
    pub fn media_type(&self) -> Option<MediaType> {
        self.content_type.parse().ok()
    }
}

/// Rejection of an upload, reported against a form field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Form field the message belongs to.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    /// Build an error against the upload field.
    pub fn file(message: impl Into<String>) -> Self {
        Self {
            field: UPLOAD_FIELD,
            message: message.into(),
        }
    }
}

/// Check an upload's media type and size, returning it unchanged when acceptable.
///
/// Checks run in order: empty file, media type, size.
pub fn validate(file: UploadedFile) -> Result<UploadedFile, ValidationError> {
    if file.content.is_empty() {
        return Err(ValidationError::file(MSG_EMPTY));
    }
    if file.media_type().is_none() {
        return Err(ValidationError::file(MSG_UNSUPPORTED));
    }
    if file.size() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::file(MSG_TOO_LARGE));
    }
    Ok(file)
}
