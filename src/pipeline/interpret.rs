//! Response interpretation: turn the OCR body into the final message.
//!
//! Two response contracts exist in the wild and both are supported:
//!
//! | Contract | Body | Result |
//! |----------|------|--------|
//! | line list | `{"result": {"txts": ["…", …]}}` | text message holding the JSON array |
//! | markdown  | `{"success": true, "output": "…", "images": {…}}` | `text/markdown` attachment |
//!
//! [`ResponseMode::Auto`] picks the contract from the body: a `result` key
//! selects the line list, anything else is read as markdown. Interpretation
//! is a pure function of its inputs.

use crate::config::ResponseMode;
use crate::error::OcrToolError;
use crate::output::{ToolMessage, MARKDOWN_MIME};
use crate::pipeline::markdown::inline_images;
use crate::pipeline::normalize::replace_extension;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use tracing::debug;

/// A parsed OCR response.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrResult {
    /// Recognised text lines, in reading order.
    Lines(Vec<String>),
    /// A Markdown document plus the images it references.
    Markdown(MarkdownResult),
}

/// Body of the markdown contract.
///
/// Failing services tend to send `null` for fields they have no value for,
/// so every field accepts `null` as well as being absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkdownResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default)]
    pub images: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct LineListBody {
    result: LineListResult,
}

#[derive(Deserialize)]
struct LineListResult {
    txts: Vec<String>,
}

/// Parse `body` according to `mode`.
pub fn parse(body: &[u8], mode: ResponseMode) -> Result<OcrResult, OcrToolError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| OcrToolError::InvalidResponse(format!("body is not JSON: {}", e)))?;

    let mode = match mode {
        ResponseMode::Auto if value.get("result").is_some() => ResponseMode::LineList,
        ResponseMode::Auto => ResponseMode::Markdown,
        explicit => explicit,
    };
    debug!("Interpreting OCR response as {:?}", mode);

    match mode {
        ResponseMode::LineList => {
            let parsed: LineListBody = serde_json::from_value(value).map_err(|e| {
                OcrToolError::InvalidResponse(format!("missing result.txts: {}", e))
            })?;
            Ok(OcrResult::Lines(parsed.result.txts))
        }
        _ => {
            let parsed: MarkdownResult = serde_json::from_value(value)
                .map_err(|e| OcrToolError::InvalidResponse(e.to_string()))?;
            Ok(OcrResult::Markdown(parsed))
        }
    }
}

/// Turn a parsed result into the message for the host.
///
/// `filename` is the name the file was submitted under (after any `.jpg`
/// rename); the Markdown attachment takes its stem.
pub fn emit(result: OcrResult, filename: &str) -> Result<ToolMessage, OcrToolError> {
    match result {
        OcrResult::Lines(lines) => {
            // serde_json leaves non-ASCII characters unescaped.
            let json = serde_json::to_string(&lines)
                .map_err(|e| OcrToolError::Internal(e.to_string()))?;
            Ok(ToolMessage::text(json))
        }
        OcrResult::Markdown(md) => {
            if !md.success {
                let message = md
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(OcrToolError::OcrRejected { message });
            }
            let markdown = match md.images {
                Some(ref images) => inline_images(&md.output, images),
                None => md.output,
            };
            Ok(ToolMessage::blob(
                markdown.into_bytes(),
                MARKDOWN_MIME,
                replace_extension(filename, "md"),
            ))
        }
    }
}

/// [`parse`] followed by [`emit`].
pub fn interpret(
    body: &[u8],
    mode: ResponseMode,
    filename: &str,
) -> Result<ToolMessage, OcrToolError> {
    emit(parse(body, mode)?, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_list_is_compact_json() {
        let body = br#"{"result": {"txts": ["a", "b"]}}"#;
        let msg = interpret(body, ResponseMode::LineList, "x.png").unwrap();
        assert_eq!(msg.as_text(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn line_list_keeps_unicode_unescaped() {
        let body = r#"{"result": {"txts": ["发票号码", "¥120"]}}"#.as_bytes();
        let msg = interpret(body, ResponseMode::Auto, "x.png").unwrap();
        assert_eq!(msg.as_text(), Some(r#"["发票号码","¥120"]"#));
    }

    #[test]
    fn line_list_without_txts_is_invalid() {
        let err = interpret(br#"{"result": {}}"#, ResponseMode::LineList, "x").unwrap_err();
        assert!(matches!(err, OcrToolError::InvalidResponse(_)));
    }

    #[test]
    fn markdown_inlines_images() {
        let body = br#"{"success": true, "output": "![](img1)", "images": {"img1": "ZZZ"}}"#;
        let msg = interpret(body, ResponseMode::Markdown, "scan.jpg").unwrap();
        assert_eq!(
            msg,
            ToolMessage::blob(
                b"![](data:image/jpeg;base64,ZZZ)".to_vec(),
                "text/markdown",
                "scan.md"
            )
        );
    }

    #[test]
    fn markdown_without_images_field() {
        let body = br##"{"success": true, "output": "# Title"}"##;
        let msg = interpret(body, ResponseMode::Auto, "report.pdf").unwrap();
        match msg {
            ToolMessage::Blob { data, filename, .. } => {
                assert_eq!(data, b"# Title");
                assert_eq!(filename, "report.md");
            }
            other => panic!("expected blob, got {other:?}"),
        }
    }

    #[test]
    fn markdown_failure_carries_error() {
        let body = br#"{"success": false, "error": "bad input"}"#;
        let err = interpret(body, ResponseMode::Markdown, "x.png").unwrap_err();
        assert!(err.to_string().contains("bad input"));
    }

    #[test]
    fn markdown_failure_with_null_fields_keeps_service_error() {
        let body = br#"{"success": false, "output": null, "images": null, "error": "bad input"}"#;
        let err = interpret(body, ResponseMode::Markdown, "x.png").unwrap_err();
        assert!(matches!(err, OcrToolError::OcrRejected { .. }));
        assert!(err.to_string().contains("bad input"), "got: {err}");
    }

    #[test]
    fn null_success_counts_as_failure() {
        let body = br#"{"success": null, "output": "ignored"}"#;
        let err = interpret(body, ResponseMode::Auto, "x.png").unwrap_err();
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn markdown_failure_without_error_field() {
        let err = interpret(br#"{"success": false}"#, ResponseMode::Markdown, "x").unwrap_err();
        assert!(err.to_string().contains("unknown error"));
    }

    #[test]
    fn auto_detects_line_list_by_result_key() {
        let parsed = parse(br#"{"result": {"txts": []}}"#, ResponseMode::Auto).unwrap();
        assert_eq!(parsed, OcrResult::Lines(vec![]));
    }

    #[test]
    fn non_json_body_is_invalid() {
        let err = parse(b"<html>", ResponseMode::Auto).unwrap_err();
        assert!(matches!(err, OcrToolError::InvalidResponse(_)));
    }

    #[test]
    fn replay_is_byte_identical() {
        let body = br#"{"success": true, "output": "![](a) ![](b)", "images": {"b": "BB", "a": "AA"}}"#;
        let first = interpret(body, ResponseMode::Auto, "p.png").unwrap();
        for _ in 0..5 {
            assert_eq!(interpret(body, ResponseMode::Auto, "p.png").unwrap(), first);
        }
    }
}
