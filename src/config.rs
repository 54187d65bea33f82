//! Configuration types for an OCR tool invocation.
//!
//! Everything the pipeline needs beyond the host-supplied parameters lives in
//! [`ToolConfig`], built via its [`ToolConfigBuilder`]. The host parameters
//! (file handle, service URL) change per call; a `ToolConfig` is typically
//! built once and shared by every invocation.

use crate::error::OcrToolError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for an OCR tool invocation.
///
/// Built via [`ToolConfig::builder()`] or using [`ToolConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2md::{ImagePolicy, ResponseMode, ToolConfig};
///
/// let config = ToolConfig::builder()
///     .response_mode(ResponseMode::Markdown)
///     .image_policy(ImagePolicy::Strict)
///     .ocr_timeout_secs(30)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ToolConfig {
    /// How the OCR response body is interpreted. Default: [`ResponseMode::Auto`].
    pub response_mode: ResponseMode,

    /// What to do with payloads that are not recognisable images.
    /// Default: [`ImagePolicy::Sniff`].
    pub image_policy: ImagePolicy,

    /// Boolean form fields sent alongside the file. Default: all `true`.
    pub ocr_flags: OcrFlags,

    /// JPEG quality used when an RGBA image is flattened to RGB. Range: 1–100.
    /// Default: 100.
    pub jpeg_quality: u8,

    /// Timeout for downloading the uploaded file, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for a single OCR POST, in seconds. Default: 60.
    pub ocr_timeout_secs: u64,

    /// Retries of the OCR POST on timeout or connection failure. Default: 0.
    ///
    /// Status-code failures are never retried; the service already answered.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Optional stage observer. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            response_mode: ResponseMode::default(),
            image_policy: ImagePolicy::default(),
            ocr_flags: OcrFlags::default(),
            jpeg_quality: 100,
            download_timeout_secs: 120,
            ocr_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolConfig")
            .field("response_mode", &self.response_mode)
            .field("image_policy", &self.image_policy)
            .field("ocr_flags", &self.ocr_flags)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn InvocationProgressCallback>"),
            )
            .finish()
    }
}

impl ToolConfig {
    /// Create a new builder for `ToolConfig`.
    pub fn builder() -> ToolConfigBuilder {
        ToolConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ToolConfig`].
#[derive(Debug)]
pub struct ToolConfigBuilder {
    config: ToolConfig,
}

impl ToolConfigBuilder {
    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.config.response_mode = mode;
        self
    }

    pub fn image_policy(mut self, policy: ImagePolicy) -> Self {
        self.config.image_policy = policy;
        self
    }

    pub fn ocr_flags(mut self, flags: OcrFlags) -> Self {
        self.config.ocr_flags = flags;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ToolConfig, OcrToolError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(OcrToolError::InvalidConfig(
                "Download timeout must be ≥ 1s".into(),
            ));
        }
        if c.ocr_timeout_secs == 0 {
            return Err(OcrToolError::InvalidConfig("OCR timeout must be ≥ 1s".into()));
        }
        if c.max_retries > 10 {
            return Err(OcrToolError::InvalidConfig(format!(
                "max_retries must be 0–10, got {}",
                c.max_retries
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which response contract the OCR service speaks.
///
/// | Mode | Response shape | Emitted message |
/// |------|----------------|-----------------|
/// | `LineList` | `{"result": {"txts": [..]}}` | text: JSON array of lines |
/// | `Markdown` | `{"success", "output", "images", "error"}` | blob: `text/markdown` |
/// | `Auto` | either | chosen from the body: a `result` object selects `LineList` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Recognised lines, emitted as a JSON array in a text message.
    LineList,
    /// Markdown with inlined images, emitted as a `.md` attachment.
    Markdown,
    /// Pick per response. (default)
    #[default]
    Auto,
}

/// Policy for payloads that are not decodable images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePolicy {
    /// Detect the file signature; anything that is not a known image format
    /// (PDF, Office documents, …) is forwarded to the service untouched. (default)
    #[default]
    Sniff,
    /// Require a decodable image; anything else aborts with
    /// [`OcrToolError::InvalidImage`].
    Strict,
}

/// Boolean switches forwarded to the OCR service as form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrFlags {
    /// Run text detection.
    pub use_det: bool,
    /// Run orientation classification.
    pub use_cls: bool,
    /// Run text recognition.
    pub use_rec: bool,
    /// Return per-word boxes.
    pub word_box: bool,
}

impl Default for OcrFlags {
    fn default() -> Self {
        Self {
            use_det: true,
            use_cls: true,
            use_rec: true,
            word_box: true,
        }
    }
}

impl OcrFlags {
    /// The flags as `(field, "true"|"false")` pairs, in wire order.
    pub fn form_fields(&self) -> [(&'static str, &'static str); 4] {
        let s = |b: bool| if b { "true" } else { "false" };
        [
            ("use_det", s(self.use_det)),
            ("use_cls", s(self.use_cls)),
            ("use_rec", s(self.use_rec)),
            ("word_box", s(self.word_box)),
        ]
    }
}
