//! Host-facing invocation parameters.
//!
//! The plugin host hands the tool an uploaded-file object plus a service URL.
//! The pipeline only ever needs two things from the file object, so it sees
//! it through the narrow [`FileHandle`] trait. [`UploadedFile`] is the plain
//! data implementation used when the parameters arrive as JSON.

use serde::{Deserialize, Serialize};

/// The minimal view of a host-managed uploaded file.
pub trait FileHandle: Send + Sync {
    /// Where the file bytes can be fetched with a GET request.
    fn url(&self) -> &str;

    /// The user-visible file name, including its extension.
    fn filename(&self) -> &str;
}

/// An uploaded file described by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
}

impl UploadedFile {
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

impl FileHandle for UploadedFile {
    fn url(&self) -> &str {
        &self.url
    }

    fn filename(&self) -> &str {
        &self.filename
    }
}

/// The parameter set the host passes to one invocation.
///
/// Both fields are optional on the wire; absence is reported to the user by
/// the pipeline rather than rejected at deserialisation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(default)]
    pub file: Option<UploadedFile>,
    #[serde(default)]
    pub service_url: Option<String>,
}

impl ToolParameters {
    /// The file handle, if the host supplied one.
    pub fn file_handle(&self) -> Option<&dyn FileHandle> {
        self.file.as_ref().map(|f| f as &dyn FileHandle)
    }

    /// The service URL, treating an empty or blank string as absent.
    pub fn service_url(&self) -> Option<&str> {
        self.service_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
