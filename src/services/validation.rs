//! Upload validation policy.
//!
//! Batch-level checks (count, total size) run first and cheaply so
//! obviously-oversized requests are rejected without touching storage;
//! per-item structural checks follow, still before any I/O.

use crate::errors::{GatewayError, GatewayResult};
use crate::models::upload::UploadFile;
use crate::services::keygen::{file_extension, file_stem};

pub const MAX_FILE_SIZE: i64 = 50 * 1024 * 1024;
pub const MAX_BATCH_FILES: usize = 10;
pub const MAX_BATCH_TOTAL_SIZE: i64 = 100 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: [&str; 24] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", // images
    "pdf", "doc", "docx", "txt", "rtf", // documents
    "xls", "xlsx", "csv", // spreadsheets
    "zip", "rar", "7z", // archives
    "mp3", "wav", "ogg", // audio
    "mp4", "avi", "mkv", "webm", // video
];

fn invalid(file_name: &str, reason: impl Into<String>) -> GatewayError {
    GatewayError::InvalidFile {
        file_name: if file_name.trim().is_empty() {
            "N/A".into()
        } else {
            file_name.into()
        },
        reason: reason.into(),
    }
}

/// Filename must be one or more of `[A-Za-z0-9._-]`, then `.`, then an
/// alphanumeric extension. Rejects path separators, spaces, and control
/// characters.
fn filename_is_well_formed(name: &str) -> bool {
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return false;
    }
    let extension = file_extension(name);
    !file_stem(name).is_empty()
        && !extension.is_empty()
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validate a single upload item. Runs no I/O.
pub fn validate_one(file: &UploadFile) -> GatewayResult<()> {
    if file.content.is_empty() {
        return Err(invalid(&file.file_name, "file cannot be empty"));
    }

    let name = file.file_name.trim();
    if name.is_empty() {
        return Err(invalid(name, "filename cannot be blank"));
    }

    if !filename_is_well_formed(&file.file_name) {
        return Err(invalid(name, "filename contains invalid characters"));
    }

    let extension = file_extension(&file.file_name).to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid(
            name,
            format!("extension `{}` is not allowed", extension),
        ));
    }

    if file.size() > MAX_FILE_SIZE {
        return Err(invalid(
            name,
            format!(
                "file too large ({:.2} MB), maximum is 50 MB",
                file.size() as f64 / (1024.0 * 1024.0)
            ),
        ));
    }

    Ok(())
}

/// Batch shape checks only: non-empty, at most 10 items, declared sizes
/// summing to at most 100 MiB.
pub fn validate_batch_limits(files: &[UploadFile]) -> GatewayResult<()> {
    if files.is_empty() {
        return Err(GatewayError::InvalidBatch("file list cannot be empty".into()));
    }

    if files.len() > MAX_BATCH_FILES {
        return Err(GatewayError::InvalidBatch(format!(
            "at most {} files per batch, got {}",
            MAX_BATCH_FILES,
            files.len()
        )));
    }

    let total: i64 = files.iter().map(UploadFile::size).sum();
    if total > MAX_BATCH_TOTAL_SIZE {
        return Err(GatewayError::InvalidBatch(format!(
            "total size {} exceeds the 100 MB batch limit",
            total
        )));
    }

    Ok(())
}

/// Strict batch validation: shape checks first, then every item. Any
/// single-item failure rejects the whole batch before any upload starts.
pub fn validate_batch(files: &[UploadFile]) -> GatewayResult<()> {
    validate_batch_limits(files)?;
    for file in files {
        validate_one(file)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn file(name: &str, size: usize) -> UploadFile {
        UploadFile::new(name, None, Bytes::from(vec![0u8; size]))
    }

    #[test]
    fn accepts_a_one_byte_pdf() {
        assert!(validate_one(&file("a.pdf", 1)).is_ok());
    }

    #[test]
    fn rejects_empty_file() {
        let err = validate_one(&file("a.pdf", 0)).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_blank_filename() {
        assert!(validate_one(&file("  ", 1)).is_err());
    }

    #[test]
    fn rejects_filename_without_extension() {
        assert!(validate_one(&file("README", 1)).is_err());
        assert!(validate_one(&file("trailing.", 1)).is_err());
        assert!(validate_one(&file(".pdf", 1)).is_err());
    }

    #[test]
    fn rejects_path_separators_and_spaces() {
        assert!(validate_one(&file("../etc/passwd.txt", 1)).is_err());
        assert!(validate_one(&file("dir/a.pdf", 1)).is_err());
        assert!(validate_one(&file("a b.pdf", 1)).is_err());
        assert!(validate_one(&file("a\tb.pdf", 1)).is_err());
    }

    #[test]
    fn rejects_disallowed_extension() {
        let err = validate_one(&file("payload.exe", 1)).unwrap_err();
        assert!(err.to_string().contains("exe"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_one(&file("photo.JPG", 1)).is_ok());
    }

    #[test]
    fn rejects_file_over_50_mib() {
        let at_limit = file("big.zip", MAX_FILE_SIZE as usize);
        assert!(validate_one(&at_limit).is_ok());

        let too_big = file("big.zip", (MAX_FILE_SIZE + 1) as usize);
        assert!(validate_one(&too_big).is_err());
    }

    #[test]
    fn batch_rejects_empty_list() {
        assert!(validate_batch(&[]).is_err());
    }

    #[test]
    fn batch_rejects_eleven_items() {
        let files: Vec<_> = (0..11).map(|i| file(&format!("f{i}.txt"), 1)).collect();
        let err = validate_batch(&files).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidBatch(_)));
    }

    #[test]
    fn batch_rejects_total_over_100_mib() {
        let files = vec![
            file("a.zip", 51 * 1024 * 1024),
            file("b.zip", 50 * 1024 * 1024),
        ];
        let err = validate_batch_limits(&files).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidBatch(_)));
    }

    #[test]
    fn batch_accepts_ten_valid_one_byte_files() {
        let files: Vec<_> = (0..10).map(|i| file(&format!("f{i}.txt"), 1)).collect();
        assert!(validate_batch(&files).is_ok());
    }

    #[test]
    fn strict_batch_fails_on_any_invalid_item() {
        let files = vec![file("ok.pdf", 1), file("bad.exe", 1)];
        assert!(validate_batch_limits(&files).is_ok());
        assert!(validate_batch(&files).is_err());
    }
}
