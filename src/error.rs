//! Error types for the ocr2md library.
//!
//! Every failure in an invocation is fatal: the pipeline is a straight line
//! (download → normalise → submit → interpret) and a broken stage leaves
//! nothing meaningful for the next one. All of them are represented by
//! [`OcrToolError`] and returned as `Err` from [`crate::invoke::try_invoke`].
//!
//! The host never sees these values directly. [`crate::invoke::invoke`]
//! folds each one into a single [`crate::output::ToolMessage::Text`] whose
//! body is the error's `Display` text, so the messages below are written for
//! the person who uploaded the file.

use thiserror::Error;

/// All fatal errors returned by the ocr2md library.
#[derive(Debug, Error)]
pub enum OcrToolError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The host did not supply an uploaded file.
    #[error("Please upload a file")]
    MissingFile,

    /// The host did not supply the OCR service URL.
    #[error("Please configure a valid OCR service URL")]
    MissingServiceUrl,

    // ── Download errors ───────────────────────────────────────────────────
    /// The file URL answered with a non-200 status.
    #[error("File download failed, status code: {status}")]
    DownloadStatus { url: String, status: u16 },

    /// The GET request could not be completed.
    #[error("Network request failed while downloading '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The GET request exceeded the configured timeout.
    #[error("File download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The payload could not be decoded as an image (strict policy only).
    #[error("File is not a valid image: {0}")]
    InvalidImage(String),

    /// Decoding or re-encoding an RGBA image failed.
    #[error("RGBA image conversion failed: {0}")]
    ConversionFailed(String),

    // ── OCR service errors ────────────────────────────────────────────────
    /// The OCR service answered with a non-200 status.
    #[error("OCR processing failed, status code: {status}")]
    OcrStatus { status: u16, body: String },

    /// The POST request could not be completed.
    #[error("Network request failed while calling the OCR service: {0}")]
    OcrRequestFailed(String),

    /// The POST request exceeded the configured timeout.
    #[error("OCR request timed out after {secs}s")]
    OcrTimeout { secs: u64 },

    /// The service reported `success: false`.
    #[error("OCR processing failed: {message}")]
    OcrRejected { message: String },

    /// The response body did not match any known contract.
    #[error("Processing failed: unexpected OCR response: {0}")]
    InvalidResponse(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Processing failed: {0}")]
    Internal(String),
}

/// Coarse classification of [`OcrToolError`] used for logging and by hosts
/// that want to react to a category rather than an exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    DownloadFailure,
    InvalidImage,
    ConversionFailure,
    OcrServiceFailure,
    UnexpectedFailure,
}

impl OcrToolError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrToolError::MissingFile | OcrToolError::MissingServiceUrl => ErrorKind::MissingInput,
            OcrToolError::DownloadStatus { .. }
            | OcrToolError::DownloadFailed { .. }
            | OcrToolError::DownloadTimeout { .. } => ErrorKind::DownloadFailure,
            OcrToolError::InvalidImage(_) => ErrorKind::InvalidImage,
            OcrToolError::ConversionFailed(_) => ErrorKind::ConversionFailure,
            OcrToolError::OcrStatus { .. }
            | OcrToolError::OcrRequestFailed(_)
            | OcrToolError::OcrTimeout { .. }
            | OcrToolError::OcrRejected { .. } => ErrorKind::OcrServiceFailure,
            OcrToolError::InvalidResponse(_)
            | OcrToolError::InvalidConfig(_)
            | OcrToolError::Internal(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Whether a retry of the OCR submission could plausibly succeed.
    ///
    /// Only transport-level failures qualify. A non-200 answer or a
    /// `success: false` body is the service's verdict and is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OcrToolError::OcrTimeout { .. } | OcrToolError::OcrRequestFailed(_)
        )
    }
}
