//! Pipeline stages for one OCR tool invocation.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the entry points in [`crate::invoke`] read as a straight line.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ ocr ──▶ interpret (+ markdown)
//! (GET)     (RGBA→JPEG)   (POST)  (lines | .md blob)
//! ```
//!
//! 1. [`input`]     — validate parameters, download the uploaded file
//! 2. [`normalize`] — sniff the format; flatten RGBA images to JPEG on the
//!    blocking pool
//! 3. [`ocr`]       — multipart POST with timeout and optional retry
//! 4. [`interpret`] — parse the response contract and build the message;
//!    [`markdown`] inlines the returned images

pub mod input;
pub mod interpret;
pub mod markdown;
pub mod normalize;
pub mod ocr;
