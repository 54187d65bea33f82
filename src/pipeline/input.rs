//! Input resolution: validate the host parameters and download the file.
//!
//! Validation runs before any network activity so a misconfigured tool
//! answers instantly. The download is held entirely in memory: uploads handed
//! to an OCR tool are single images or short documents, and every later
//! stage works on a byte buffer anyway.

use crate::error::OcrToolError;
use crate::params::FileHandle;
use std::time::Duration;
use tracing::{debug, info};

/// The file being processed: its bytes and the name it travels under.
///
/// Stages that change the content return a new `FileContent` rather than
/// mutating the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl FileContent {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }
}

/// Validated invocation inputs.
pub struct ValidatedInput<'a> {
    pub file: &'a dyn FileHandle,
    pub service_url: &'a str,
}

/// Check that both required parameters are present.
///
/// The file is checked first, matching the order the user fills them in.
pub fn validate<'a>(
    file: Option<&'a dyn FileHandle>,
    service_url: Option<&'a str>,
) -> Result<ValidatedInput<'a>, OcrToolError> {
    let file = file.ok_or(OcrToolError::MissingFile)?;
    let service_url = service_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(OcrToolError::MissingServiceUrl)?;
    Ok(ValidatedInput { file, service_url })
}

/// Build an HTTP client whose every request is bounded by `timeout_secs`.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, OcrToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OcrToolError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Download the uploaded file into memory.
///
/// Anything other than `200 OK` is fatal and is never retried.
pub async fn download(
    client: &reqwest::Client,
    file: &dyn FileHandle,
    timeout_secs: u64,
) -> Result<FileContent, OcrToolError> {
    let url = file.url();
    info!("Downloading uploaded file: {}", file.filename());

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            OcrToolError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OcrToolError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_err)?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(OcrToolError::DownloadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(map_err)?;
    debug!("Downloaded {} bytes from {}", bytes.len(), url);

    Ok(FileContent::new(bytes.to_vec(), file.filename()))
}
