//! The message an invocation hands back to the host.
//!
//! An invocation produces exactly one [`ToolMessage`]: either text (an error
//! description or the JSON array of recognised lines) or a binary blob (the
//! Markdown attachment).

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// MIME type of the Markdown attachment.
pub const MARKDOWN_MIME: &str = "text/markdown";

/// The single result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolMessage {
    /// A plain text message.
    Text { text: String },
    /// A binary attachment.
    Blob {
        #[serde(with = "blob_base64")]
        data: Vec<u8>,
        mime_type: String,
        filename: String,
    },
}

impl ToolMessage {
    pub fn text(text: impl Into<String>) -> Self {
        ToolMessage::Text { text: text.into() }
    }

    pub fn blob(data: Vec<u8>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        ToolMessage::Blob {
            data,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }

    /// The text body, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolMessage::Text { text } => Some(text),
            ToolMessage::Blob { .. } => None,
        }
    }

    /// Persist a blob into `dir` under its own filename.
    ///
    /// Writes through a temp file in the same directory and renames it into
    /// place, so readers never observe a partial file. Returns `Ok(None)` for
    /// text messages.
    pub fn write_blob_to(&self, dir: impl AsRef<Path>) -> std::io::Result<Option<PathBuf>> {
        let ToolMessage::Blob { data, filename, .. } = self else {
            return Ok(None);
        };
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        // Only the final path component; the name comes from a remote host.
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output.md".into());
        let target = dir.join(name);

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(Some(target))
    }
}

mod blob_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
