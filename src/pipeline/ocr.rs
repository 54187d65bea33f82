//! OCR submission: multipart POST of the normalised file to the service.
//!
//! The request carries the file under `image_file` plus the boolean
//! [`OcrFlags`](crate::config::OcrFlags) as text fields. With
//! [`ResponseMode::Markdown`] an empty `image_data` field is added as well,
//! as Markdown-producing services expect. `LineList` and `Auto` leave it out;
//! set the mode explicitly for a service that insists on the field.
//!
//! ## Retry Strategy
//!
//! Off by default. With `max_retries > 0`, only transport failures
//! (timeouts, refused or reset connections) are retried, with exponential
//! backoff `retry_backoff_ms * 2^(attempt-1)`, saturating at `u64::MAX`
//! milliseconds. A non-200 status is the
//! service's answer and is returned immediately.

use crate::config::{ResponseMode, ToolConfig};
use crate::error::OcrToolError;
use crate::pipeline::input::FileContent;
use reqwest::multipart::{Form, Part};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Form field that carries the file.
pub const FILE_FIELD: &str = "image_file";

/// The raw 200 response from the OCR service.
#[derive(Debug, Clone)]
pub struct OcrResponse {
    pub body: Vec<u8>,
    /// Number of retries it took to get the response.
    pub retries: u32,
}

/// Submit `content` to `service_url`, retrying transport failures per config.
pub async fn submit(
    client: &reqwest::Client,
    service_url: &str,
    content: &FileContent,
    config: &ToolConfig,
) -> Result<OcrResponse, OcrToolError> {
    info!("OCR service URL: {}", service_url);

    let mut attempt = 0u32;
    loop {
        match submit_once(client, service_url, content, config).await {
            Ok(body) => {
                return Ok(OcrResponse {
                    body,
                    retries: attempt,
                })
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let backoff = backoff_ms(config.retry_backoff_ms, attempt);
                warn!(
                    "OCR request failed ({}), retry {}/{} after {}ms",
                    e, attempt, config.max_retries, backoff
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_retry(attempt, config.max_retries, &e.to_string());
                }
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

/// One POST attempt.
async fn submit_once(
    client: &reqwest::Client,
    service_url: &str,
    content: &FileContent,
    config: &ToolConfig,
) -> Result<Vec<u8>, OcrToolError> {
    let form = build_form(content, config)?;
    let secs = config.ocr_timeout_secs;
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            OcrToolError::OcrTimeout { secs }
        } else {
            OcrToolError::OcrRequestFailed(e.to_string())
        }
    };

    let response = client
        .post(service_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .timeout(Duration::from_secs(secs))
        .multipart(form)
        .send()
        .await
        .map_err(map_err)?;

    let status = response.status();
    debug!("OCR response status: {}", status);

    if status != reqwest::StatusCode::OK {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(OcrToolError::OcrStatus {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await.map_err(map_err)?;
    debug!("OCR response body: {} bytes", body.len());
    Ok(body.to_vec())
}

/// Assemble the multipart body for one attempt.
///
/// A fresh form is built per attempt because `reqwest` consumes it.
fn build_form(content: &FileContent, config: &ToolConfig) -> Result<Form, OcrToolError> {
    let mime = guess_mime(&content.filename);
    let part = Part::bytes(content.bytes.clone())
        .file_name(content.filename.clone())
        .mime_str(mime)
        .map_err(|e| OcrToolError::Internal(format!("Invalid MIME type: {}", e)))?;

    let mut form = Form::new().part(FILE_FIELD, part);
    for (name, value) in config.ocr_flags.form_fields() {
        form = form.text(name, value);
    }
    if config.response_mode == ResponseMode::Markdown {
        form = form.text("image_data", "");
    }
    Ok(form)
}

/// MIME type from the file extension; the service sniffs content anyway.
fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::http_client;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn content() -> FileContent {
        FileContent::new(b"fake image".to_vec(), "scan.jpg")
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime("a.JPG"), "image/jpeg");
        assert_eq!(guess_mime("doc.pdf"), "application/pdf");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 4), 4000);
        assert_eq!(backoff_ms(u64::MAX, 3), u64::MAX);
        assert_eq!(backoff_ms(u64::MAX / 2 + 1, 2), u64::MAX);
        assert_eq!(backoff_ms(1, 100), u64::MAX);
    }

    #[tokio::test]
    async fn multipart_carries_file_and_flags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("name=\"image_file\"; filename=\"scan.jpg\""))
            .and(body_string_contains("name=\"use_det\"\r\n\r\ntrue"))
            .and(body_string_contains("name=\"word_box\"\r\n\r\ntrue"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ToolConfig::default();
        let client = http_client(5).unwrap();
        let resp = submit(&client, &format!("{}/ocr", server.uri()), &content(), &config)
            .await
            .unwrap();
        assert_eq!(resp.body, b"{}");
        assert_eq!(resp.retries, 0);
    }

    #[tokio::test]
    async fn markdown_mode_sends_empty_image_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("name=\"image_data\"\r\n\r\n\r\n"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ToolConfig::builder()
            .response_mode(ResponseMode::Markdown)
            .build()
            .unwrap();
        let client = http_client(5).unwrap();
        submit(&client, &server.uri(), &content(), &config)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn auto_mode_omits_image_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = http_client(5).unwrap();
        submit(&client, &server.uri(), &content(), &ToolConfig::default())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"use_rec\""));
        assert!(!body.contains("name=\"image_data\""));
    }

    #[tokio::test]
    async fn non_200_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ToolConfig::builder()
            .max_retries(3)
            .retry_backoff_ms(1)
            .build()
            .unwrap();
        let client = http_client(5).unwrap();
        let err = submit(&client, &server.uri(), &content(), &config)
            .await
            .unwrap_err();
        match err {
            OcrToolError::OcrStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_is_retried_then_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .expect(3)
            .mount(&server)
            .await;

        let config = ToolConfig::builder()
            .ocr_timeout_secs(1)
            .max_retries(2)
            .retry_backoff_ms(1)
            .build()
            .unwrap();
        let client = http_client(5).unwrap();
        let err = submit(&client, &server.uri(), &content(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrToolError::OcrTimeout { secs: 1 }));
    }
}
