//! Storage key derivation.
//!
//! Keys are time-partitioned so listings can be scoped by calendar period
//! without scanning the whole namespace, and carry a random disambiguator so
//! repeated uploads of the same filename never collide.

use crate::errors::{GatewayError, GatewayResult};
use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

const KEY_PREFIX: &str = "files";

/// Derive a unique storage key from a display filename.
///
/// Shape: `files/<year>/<month>/<base>-<rand8>.<ext>`, with the trailing
/// extension omitted for extensionless names. Non-deterministic by design:
/// the same input yields a different key on every call.
pub fn generate_key(original_filename: &str) -> GatewayResult<String> {
    generate_key_at(original_filename, Utc::now().date_naive())
}

pub(crate) fn generate_key_at(original_filename: &str, date: NaiveDate) -> GatewayResult<String> {
    if original_filename.trim().is_empty() {
        return Err(GatewayError::InvalidFile {
            file_name: "N/A".into(),
            reason: "filename cannot be blank".into(),
        });
    }

    let extension = file_extension(original_filename);
    let base = file_stem(original_filename);
    let uuid = Uuid::new_v4().simple().to_string();
    let disambiguator = &uuid[..8];

    let mut key = format!(
        "{}/{}/{:02}/{}-{}",
        KEY_PREFIX,
        date.year(),
        date.month(),
        base,
        disambiguator
    );
    if !extension.is_empty() {
        key.push('.');
        key.push_str(extension);
    }
    Ok(key)
}

/// Extension after the last `.`, empty when there is none.
pub fn file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => &filename[idx + 1..],
        _ => "",
    }
}

/// Filename with the extension (and its dot) stripped.
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    }
}

/// Trailing path segment of a key, used to recover a display name when no
/// metadata survives.
pub fn file_name_from_key(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) if idx + 1 < key.len() => &key[idx + 1..],
        _ => key,
    }
}
