//! Upload input item as received from the boundary.

use bytes::Bytes;

/// A file handed to the gateway for storage.
///
/// The declared `file_name` and optional `content_type` come from the
/// client; `content` is the full payload (the gateway does not stream
/// large-object uploads).
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        content: Bytes,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            content,
        }
    }

    /// Declared size in bytes.
    pub fn size(&self) -> i64 {
        self.content.len() as i64
    }
}
