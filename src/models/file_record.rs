//! Represents a file stored behind the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing a single stored file.
///
/// Produced by `StorageGateway` on every successful store/inspect/copy
/// operation. The `key` is the only stable identity within the store's
/// namespace; `file_name` is display-only and may collide across records.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Original (display) filename of the uploaded file.
    pub file_name: String,

    /// Unique storage key, e.g. `files/2026/08/report-1a2b3c4d.pdf`.
    pub key: String,

    /// Size in bytes, never negative.
    pub size: i64,

    /// MIME type of the content.
    pub content_type: String,

    /// ETag returned by the backend (content hash).
    pub e_tag: String,

    /// Timestamp of the last modification known to the backend.
    pub last_modified: DateTime<Utc>,

    /// Public URL for direct access to the object.
    pub url: String,
}

impl FileRecord {
    /// Human-readable size, e.g. `1.5 MB`.
    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }
}

/// Format a byte count with binary unit steps.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "0 B".into();
    }

    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_byte_sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(-5), "0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1_572_864), "1.5 MB");
    }
}
