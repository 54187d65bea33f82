//! # ocr2md
//!
//! A plugin tool that sends an uploaded file to an OCR HTTP service and hands
//! back either the recognised text lines or a self-contained Markdown
//! document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! host parameters (file handle, service URL)
//!  │
//!  ├─ 1. Validate   file and service URL present, else stop before any I/O
//!  ├─ 2. Download   GET the uploaded file into memory
//!  ├─ 3. Normalise  sniff format; RGBA → RGB JPEG (spawn_blocking)
//!  ├─ 4. OCR        multipart POST: image_file + use_det/use_cls/use_rec/word_box
//!  ├─ 5. Interpret  line list → JSON text, or markdown → inline images
//!  └─ 6. Emit       exactly one ToolMessage (Text or Blob)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{invoke, ResponseMode, ToolConfig, ToolMessage, ToolParameters, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ToolConfig::builder()
//!         .response_mode(ResponseMode::Markdown)
//!         .build()?;
//!     let params = ToolParameters {
//!         file: Some(UploadedFile::new("https://files.local/scan", "scan.png")),
//!         service_url: Some("http://localhost:9003/ocr".into()),
//!     };
//!     match invoke(&params, &config).await {
//!         ToolMessage::Text { text } => println!("{text}"),
//!         ToolMessage::Blob { filename, .. } => println!("attachment: {filename}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod invoke;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImagePolicy, OcrFlags, ResponseMode, ToolConfig, ToolConfigBuilder};
pub use error::{ErrorKind, OcrToolError};
pub use invoke::{invoke, invoke_sync, try_invoke};
pub use output::{ToolMessage, MARKDOWN_MIME};
pub use params::{FileHandle, ToolParameters, UploadedFile};
pub use pipeline::interpret::OcrResult;
pub use progress::{InvocationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
