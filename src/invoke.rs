//! Invocation entry points.
//!
//! [`try_invoke`] runs the pipeline and returns `Result<ToolMessage, _>`;
//! [`invoke`] is what a host calls and folds any error into a text message,
//! so every call yields exactly one [`ToolMessage`].

use crate::config::ToolConfig;
use crate::error::OcrToolError;
use crate::output::ToolMessage;
use crate::params::{FileHandle, ToolParameters};
use crate::pipeline::{input, interpret, normalize, ocr};
use crate::progress::Stage;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run one invocation for the host.
///
/// Never fails: validation, network and processing errors all become a
/// [`ToolMessage::Text`] carrying the error description.
///
/// # Example
/// ```rust,no_run
/// use ocr2md::{invoke, ToolConfig, ToolParameters, UploadedFile};
///
/// # #[tokio::main]
/// # async fn main() {
/// let params = ToolParameters {
///     file: Some(UploadedFile::new("https://files.local/abc", "receipt.png")),
///     service_url: Some("http://localhost:9003/ocr".into()),
/// };
/// let message = invoke(&params, &ToolConfig::default()).await;
/// println!("{:?}", message);
/// # }
/// ```
pub async fn invoke(params: &ToolParameters, config: &ToolConfig) -> ToolMessage {
    let outcome = try_invoke(params.file_handle(), params.service_url(), config).await;
    if let Some(ref cb) = config.progress_callback {
        cb.on_invocation_complete(outcome.is_err());
    }
    match outcome {
        Ok(message) => message,
        Err(e) => {
            warn!("Invocation failed ({:?}): {}", e.kind(), e);
            ToolMessage::text(e.to_string())
        }
    }
}

/// Run the pipeline, returning the first fatal error.
///
/// Missing parameters are reported before any network activity.
pub async fn try_invoke(
    file: Option<&dyn FileHandle>,
    service_url: Option<&str>,
    config: &ToolConfig,
) -> Result<ToolMessage, OcrToolError> {
    let start = Instant::now();

    // ── Step 1: Validate parameters ──────────────────────────────────────
    let validated = input::validate(file, service_url)?;

    let client = input::http_client(config.download_timeout_secs)?;

    // ── Step 2: Download ─────────────────────────────────────────────────
    notify(config, Stage::Download);
    let content = input::download(&client, validated.file, config.download_timeout_secs).await?;

    // ── Step 3: Normalise ────────────────────────────────────────────────
    notify(config, Stage::Normalize);
    let content = normalize::normalize(content, config.image_policy, config.jpeg_quality).await?;
    info!("filename: {}", content.filename);

    // ── Step 4: Submit to OCR ────────────────────────────────────────────
    notify(config, Stage::Submit);
    let response = ocr::submit(&client, validated.service_url, &content, config).await?;
    if response.retries > 0 {
        debug!("OCR succeeded after {} retries", response.retries);
    }

    // ── Step 5: Interpret ────────────────────────────────────────────────
    notify(config, Stage::Interpret);
    let message = interpret::interpret(&response.body, config.response_mode, &content.filename)?;

    info!("Invocation complete in {}ms", start.elapsed().as_millis());
    Ok(message)
}

/// Synchronous wrapper around [`invoke`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn invoke_sync(params: &ToolParameters, config: &ToolConfig) -> ToolMessage {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(invoke(params, config)),
        Err(e) => ToolMessage::text(
            OcrToolError::Internal(format!("Failed to create tokio runtime: {}", e)).to_string(),
        ),
    }
}

fn notify(config: &ToolConfig, stage: Stage) {
    debug!("Stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}
