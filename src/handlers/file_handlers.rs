//! HTTP handlers for file management operations.
//!
//! Thin boundary: multipart/query parsing, duration bounds, and response
//! shaping live here; everything else is delegated to the gateway core.

use crate::{
    errors::AppError,
    models::upload::UploadFile,
    services::keygen,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

const DEFAULT_DURATION_MINUTES: i64 = 60;
const MAX_DURATION_MINUTES: i64 = 1440;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationQuery {
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyQuery {
    pub source_key: String,
    pub destination_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadQuery {
    pub file_name: String,
    pub content_type: String,
    pub duration_minutes: Option<i64>,
}

/// Enforce the [1, 1440] minute presign window at the boundary.
fn duration_from_query(minutes: Option<i64>) -> Result<Duration, AppError> {
    let minutes = minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(AppError::bad_request(format!(
            "durationMinutes must be between 1 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// Collect every part with the given field name into upload items.
async fn collect_files(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<UploadFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("malformed multipart body: {err}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("could not read part: {err}")))?;
        files.push(UploadFile::new(file_name, content_type, data));
    }
    Ok(files)
}

/// POST `/files/upload` — single multipart upload (field `file`).
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = collect_files(&mut multipart, "file")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::bad_request("missing multipart field `file`"))?;

    info!("upload requested for `{}`", file.file_name);

    let record = state.coordinator.upload_one(&file).await?;

    let total_size = record.size;
    let body = json!({
        "success": true,
        "message": "file uploaded successfully",
        "files": [record],
        "uploadedAt": Utc::now(),
        "totalFiles": 1,
        "totalSize": total_size,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST `/files/upload-multiple` — batch multipart upload (field `files`).
pub async fn upload_multiple_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = collect_files(&mut multipart, "files").await?;
    info!("batch upload requested for {} files", files.len());

    let result = state.coordinator.upload_all(files).await?;
    let total_size: i64 = result.succeeded.iter().map(|r| r.size).sum();

    let body = json!({
        "success": result.failed.is_empty(),
        "message": format!(
            "{} of {} file(s) uploaded successfully",
            result.succeeded.len(),
            result.attempted.len()
        ),
        "result": result,
        "uploadedAt": Utc::now(),
        "totalSize": total_size,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET `/files/download/{*key}` — full-content download.
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let content = state.gateway.retrieve(&key).await?;
    let info = state.gateway.get_info(&key).await?;

    let mut response = Response::new(Body::from(content));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&info.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&info.size.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    let disposition = format!("attachment; filename=\"{}\"", info.file_name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// GET `/files` — list all files in the bucket.
pub async fn list_all_files(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let files = state.gateway.list(None).await?;
    Ok(Json(files))
}

/// GET `/files/prefix/{*prefix}` — list files scoped by key prefix.
pub async fn list_files_by_prefix(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if prefix.trim().is_empty() {
        return Err(AppError::bad_request("prefix cannot be blank"));
    }
    let files = state.gateway.list(Some(&prefix)).await?;
    Ok(Json(files))
}

/// GET `/files/info/{*key}` — metadata for a single file.
pub async fn get_file_info(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let info = state.gateway.get_info(&key).await?;
    Ok(Json(info))
}

/// GET `/files/exists/{*key}` — existence probe, never errors on absence.
pub async fn file_exists(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exists = state.gateway.exists(&key).await;
    Ok(Json(json!({
        "key": key,
        "exists": exists,
        "message": if exists { "file exists" } else { "file not found" },
    })))
}

/// DELETE `/files/{*key}` — delete a single file.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.gateway.delete(&key).await?;
    Ok(Json(json!({
        "success": deleted,
        "message": if deleted { "file deleted successfully" } else { "failed to delete file" },
        "key": key,
    })))
}

/// DELETE `/files/batch` — delete a list of keys, reporting the summary.
pub async fn delete_multiple_files(
    State(state): State<AppState>,
    Json(keys): Json<Vec<String>>,
) -> Result<impl IntoResponse, AppError> {
    if keys.iter().any(|key| key.trim().is_empty()) {
        return Err(AppError::bad_request("keys cannot be blank"));
    }

    let summary = state.coordinator.delete_all(keys).await;
    let message = format!(
        "{} of {} file(s) deleted successfully",
        summary.deleted_count, summary.total_requested
    );
    Ok(Json(json!({
        "totalRequested": summary.total_requested,
        "deletedCount": summary.deleted_count,
        "failedCount": summary.failed_count,
        "failedKeys": summary.failed_keys,
        "message": message,
    })))
}

/// POST `/files/copy?sourceKey=..&destinationKey=..`
pub async fn copy_file(
    State(state): State<AppState>,
    Query(params): Query<CopyQuery>,
) -> Result<impl IntoResponse, AppError> {
    if params.source_key.trim().is_empty() || params.destination_key.trim().is_empty() {
        return Err(AppError::bad_request("sourceKey and destinationKey are required"));
    }

    let record = state
        .gateway
        .copy(&params.source_key, &params.destination_key)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET `/files/presigned-url/download/{*key}?durationMinutes=`
pub async fn presign_download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DurationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let duration = duration_from_query(query.duration_minutes)?;
    let grant = state.presigner.issue_for_download(&key, duration).await?;
    Ok(Json(grant))
}

/// POST `/files/presigned-url/upload?fileName=&contentType=&durationMinutes=`
pub async fn presign_upload(
    State(state): State<AppState>,
    Query(query): Query<PresignUploadQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.file_name.trim().is_empty() || query.content_type.trim().is_empty() {
        return Err(AppError::bad_request("fileName and contentType are required"));
    }

    let duration = duration_from_query(query.duration_minutes)?;
    let grant = state
        .presigner
        .issue_for_upload(&query.file_name, &query.content_type, duration)
        .await?;
    Ok(Json(grant))
}

/// GET `/files/stats` — bucket totals and per-extension counts.
pub async fn bucket_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let files = state.gateway.list(None).await?;

    let total_size: i64 = files.iter().map(|f| f.size).sum();
    let mut by_extension: HashMap<String, u64> = HashMap::new();
    for file in &files {
        let extension = keygen::file_extension(&file.file_name).to_ascii_lowercase();
        *by_extension.entry(extension).or_default() += 1;
    }

    Ok(Json(json!({
        "totalFiles": files.len(),
        "totalSize": total_size,
        "totalSizeFormatted": crate::models::file_record::format_size(total_size),
        "filesByExtension": by_extension,
        "lastUpdated": Utc::now(),
    })))
}
