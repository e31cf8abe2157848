//! Contract over the external object store.
//!
//! The transport, authentication, and retry policy all live behind this
//! trait; the gateway core only sees the primitives below. Implementations
//! must be thread-safe (`Send + Sync`) for use with tokio.

use crate::models::presigned::PresignOperation;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Failure modes of the backing store.
///
/// A missing key is a distinct condition, never a zero-length result;
/// everything else is an opaque backend fault.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata returned by a `head` call.
#[derive(Clone, Debug)]
pub struct HeadObject {
    pub size: i64,
    pub content_type: Option<String>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    /// Descriptive metadata attached at upload time.
    pub metadata: HashMap<String, String>,
}

/// One entry of a listing. Listings carry no attached metadata.
#[derive(Clone, Debug)]
pub struct ListedObject {
    pub key: String,
    pub size: i64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Per-key error from a bulk delete.
#[derive(Clone, Debug)]
pub struct BatchDeleteError {
    pub key: String,
    pub message: String,
}

/// Outcome of a bulk delete: which keys went away and which did not.
#[derive(Clone, Debug, Default)]
pub struct BatchDeleteResult {
    pub deleted: Vec<String>,
    pub failed: Vec<BatchDeleteError>,
}

/// Primitive operations the gateway requires from an object store.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    /// Store an object and return its ETag.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StoreResult<String>;

    /// Fetch an object's full content. `NotFound` when the key is absent.
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes>;

    /// Fetch metadata without the payload. `NotFound` when the key is absent.
    async fn head(&self, bucket: &str, key: &str) -> StoreResult<HeadObject>;

    /// Single-page listing, optionally scoped by key prefix. Ordering is
    /// backend-defined.
    async fn list(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ListedObject>>;

    /// Remove one object. Idempotent: deleting an absent key succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> StoreResult<()>;

    /// Remove several objects, reporting per-key outcomes.
    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<BatchDeleteResult>;

    /// Server-side copy within the bucket. `NotFound` when the source is
    /// absent.
    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> StoreResult<()>;

    /// Produce a signed URL honoring `operation` until `expires_in` elapses.
    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        operation: PresignOperation,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> StoreResult<String>;
}
