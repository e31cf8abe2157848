//! Defines routes for all file-gateway operations.
//!
//! ## Structure
//! - **Health endpoints**
//!   - `GET    /healthz` — liveness
//!   - `GET    /readyz`  — readiness (DB + disk checks)
//!
//! - **File endpoints** (under `/files`)
//!   - `POST   /files/upload`           — single multipart upload
//!   - `POST   /files/upload-multiple`  — batch multipart upload
//!   - `GET    /files`                  — list all files
//!   - `GET    /files/prefix/{*prefix}` — list by key prefix
//!   - `GET    /files/download/{*key}`  — download content
//!   - `GET    /files/info/{*key}`      — metadata only
//!   - `GET    /files/exists/{*key}`    — existence probe
//!   - `GET    /files/stats`            — bucket statistics
//!   - `DELETE /files/batch`            — delete a list of keys
//!   - `DELETE /files/{*key}`           — delete one file
//!   - `POST   /files/copy`             — copy source to destination key
//!   - `GET    /files/presigned-url/download/{*key}` — signed download URL
//!   - `POST   /files/presigned-url/upload`          — signed upload URL
//!
//! The wildcard `{*key}` allows nested keys like `files/2026/08/img.jpg`.

use crate::{
    handlers::{
        file_handlers::{
            bucket_stats, copy_file, delete_file, delete_multiple_files, download_file,
            file_exists, get_file_info, list_all_files, list_files_by_prefix, presign_download,
            presign_upload, upload_file, upload_multiple_files,
        },
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build and return the router for the whole gateway API.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // file endpoints
        .route("/files", get(list_all_files))
        .route("/files/upload", post(upload_file))
        .route("/files/upload-multiple", post(upload_multiple_files))
        .route("/files/prefix/{*prefix}", get(list_files_by_prefix))
        .route("/files/download/{*key}", get(download_file))
        .route("/files/info/{*key}", get(get_file_info))
        .route("/files/exists/{*key}", get(file_exists))
        .route("/files/stats", get(bucket_stats))
        .route("/files/copy", post(copy_file))
        .route("/files/presigned-url/download/{*key}", get(presign_download))
        .route("/files/presigned-url/upload", post(presign_upload))
        .route("/files/batch", delete(delete_multiple_files))
        .route("/files/{*key}", delete(delete_file))
}
