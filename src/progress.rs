//! Progress-callback trait for per-stage invocation events.
//!
//! Inject an [`Arc<dyn InvocationProgressCallback>`] via
//! [`crate::config::ToolConfigBuilder::progress_callback`] to observe the
//! pipeline as it moves through its stages. The CLI uses this to drive a
//! spinner; a host could forward the events to its own UI.
//!
//! # Example
//!
//! ```rust
//! use ocr2md::{InvocationProgressCallback, Stage, ToolConfig};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl InvocationProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {}", stage);
//!     }
//! }
//!
//! let config = ToolConfig::builder()
//!     .progress_callback(Arc::new(PrintStages) as Arc<dyn InvocationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching the uploaded file from the host.
    Download,
    /// Sniffing the format and converting RGBA images.
    Normalize,
    /// Posting the multipart request to the OCR service.
    Submit,
    /// Turning the OCR response into the final message.
    Interpret,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Download => "downloading file",
            Stage::Normalize => "checking image format",
            Stage::Submit => "calling OCR service",
            Stage::Interpret => "building result",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as an invocation progresses.
///
/// All methods default to no-ops so implementations only override what they
/// care about.
pub trait InvocationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called before an OCR submission is retried.
    ///
    /// # Arguments
    /// * `attempt`     — 1-indexed retry number
    /// * `max_retries` — configured retry budget
    /// * `error`       — the failure that triggered the retry
    fn on_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let _ = (attempt, max_retries, error);
    }

    /// Called once with the outcome, right before the message is returned.
    fn on_invocation_complete(&self, is_error: bool) {
        let _ = is_error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl InvocationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ToolConfig`].
pub type ProgressCallback = Arc<dyn InvocationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        retries: Mutex<Vec<u32>>,
    }

    impl InvocationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_retry(&self, attempt: u32, _max_retries: u32, _error: &str) {
            self.retries.lock().unwrap().push(attempt);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Download);
        cb.on_retry(1, 3, "timeout");
        cb.on_invocation_complete(false);
    }

    #[test]
    fn recorder_receives_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Download);
        rec.on_stage_start(Stage::Submit);
        rec.on_retry(1, 2, "reset");
        assert_eq!(*rec.stages.lock().unwrap(), vec![Stage::Download, Stage::Submit]);
        assert_eq!(*rec.retries.lock().unwrap(), vec![1]);
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::Submit.to_string(), "calling OCR service");
    }
}
