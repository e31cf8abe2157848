//! StorageGateway — the only component that talks to the object store.
//!
//! Wraps the external client, owns the bucket identifier and the base URL
//! used to build public object URLs. All operations are stateless given
//! their inputs and the store's current state.

use crate::errors::{GatewayError, GatewayResult};
use crate::models::file_record::FileRecord;
use crate::services::{content_type, keygen};
use crate::storage::client::{BatchDeleteResult, ObjectStoreClient, StoreError};
use bytes::Bytes;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};

pub const METADATA_ORIGINAL_FILENAME: &str = "original-filename";
pub const METADATA_CONTENT_TYPE: &str = "content-type";
pub const METADATA_UPLOAD_TIMESTAMP: &str = "upload-timestamp";
pub const METADATA_UPLOADED_BY: &str = "uploaded-by";

const UPLOADER_TAG: &str = "file-gateway";

#[derive(Clone)]
pub struct StorageGateway {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    /// Root for public object URLs, e.g. `http://localhost:3000`.
    public_base_url: String,
}

impl StorageGateway {
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn client(&self) -> Arc<dyn ObjectStoreClient> {
        Arc::clone(&self.client)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    /// Store `content` under `key`, attaching descriptive metadata so a later
    /// `get_info` can recover the display filename. Backend faults surface as
    /// `Upload` errors.
    pub async fn store(
        &self,
        file_name: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> GatewayResult<FileRecord> {
        debug!("storing `{}` as {}", file_name, key);

        let metadata = HashMap::from([
            (METADATA_ORIGINAL_FILENAME.to_string(), file_name.to_string()),
            (METADATA_CONTENT_TYPE.to_string(), content_type.to_string()),
            (METADATA_UPLOAD_TIMESTAMP.to_string(), Utc::now().to_rfc3339()),
            (METADATA_UPLOADED_BY.to_string(), UPLOADER_TAG.to_string()),
        ]);

        let size = content.len() as i64;
        let etag = self
            .client
            .put(&self.bucket, key, content, Some(content_type), metadata)
            .await
            .map_err(|err| GatewayError::Upload {
                file_name: file_name.to_string(),
                reason: err.to_string(),
            })?;

        info!("stored {} ({} bytes, etag {})", key, size, etag);

        Ok(FileRecord {
            file_name: file_name.to_string(),
            key: key.to_string(),
            size,
            content_type: content_type.to_string(),
            e_tag: etag,
            last_modified: Utc::now(),
            url: self.object_url(key),
        })
    }

    /// Fetch an object's full content. Absence is a distinct `NotFound`, not
    /// a zero-length result.
    pub async fn retrieve(&self, key: &str) -> GatewayResult<Bytes> {
        debug!("retrieving {}", key);
        let bytes = self.client.get(&self.bucket, key).await?;
        info!("retrieved {} ({} bytes)", key, bytes.len());
        Ok(bytes)
    }

    /// Reconstruct a `FileRecord` from stored metadata, falling back to the
    /// trailing key segment for the display name.
    pub async fn get_info(&self, key: &str) -> GatewayResult<FileRecord> {
        let head = self.client.head(&self.bucket, key).await?;

        let file_name = head
            .metadata
            .get(METADATA_ORIGINAL_FILENAME)
            .cloned()
            .unwrap_or_else(|| keygen::file_name_from_key(key).to_string());
        let content_type = head
            .content_type
            .unwrap_or_else(|| content_type::resolve(&file_name).to_string());

        Ok(FileRecord {
            file_name,
            key: key.to_string(),
            size: head.size,
            content_type,
            e_tag: head.etag,
            last_modified: head.last_modified,
            url: self.object_url(key),
        })
    }

    /// Best-effort existence check. `false` means "proceed as if absent":
    /// backend faults are logged and swallowed, so callers must not treat
    /// `false` as a hard guarantee under backend instability.
    pub async fn exists(&self, key: &str) -> bool {
        match self.client.head(&self.bucket, key).await {
            Ok(_) => true,
            Err(StoreError::NotFound(_)) => false,
            Err(err) => {
                warn!("existence check for {} failed: {}", key, err);
                false
            }
        }
    }

    /// Single unbounded listing, optionally scoped by prefix. Ordering is
    /// backend-defined.
    pub async fn list(&self, prefix: Option<&str>) -> GatewayResult<Vec<FileRecord>> {
        let listed = self.client.list(&self.bucket, prefix).await?;
        let records = listed
            .into_iter()
            .map(|obj| {
                let file_name = keygen::file_name_from_key(&obj.key).to_string();
                let content_type = content_type::resolve(&file_name).to_string();
                let url = self.object_url(&obj.key);
                FileRecord {
                    file_name,
                    key: obj.key,
                    size: obj.size,
                    content_type,
                    e_tag: obj.etag,
                    last_modified: obj.last_modified,
                    url,
                }
            })
            .collect::<Vec<_>>();
        info!(
            "listed {} objects (prefix: {})",
            records.len(),
            prefix.unwrap_or("<none>")
        );
        Ok(records)
    }

    /// Delete one object. Absence is checked first and surfaces as
    /// `NotFound`; a fault in the delete call itself is swallowed into
    /// `false` so speculative deletes stay safe to issue.
    pub async fn delete(&self, key: &str) -> GatewayResult<bool> {
        if !self.exists(key).await {
            warn!("refusing to delete missing key {}", key);
            return Err(GatewayError::NotFound(key.to_string()));
        }

        match self.client.delete(&self.bucket, key).await {
            Ok(()) => {
                info!("deleted {}", key);
                Ok(true)
            }
            Err(err) => {
                warn!("delete of {} failed: {}", key, err);
                Ok(false)
            }
        }
    }

    /// Bulk delete. Per-key failures are logged and reported, never abort
    /// the batch; a whole-call backend fault marks every key failed.
    pub async fn delete_many(&self, keys: &[String]) -> BatchDeleteResult {
        match self.client.delete_batch(&self.bucket, keys).await {
            Ok(result) => {
                for failure in &result.failed {
                    warn!("failed to delete {}: {}", failure.key, failure.message);
                }
                info!(
                    "bulk delete finished: {} deleted, {} failed",
                    result.deleted.len(),
                    result.failed.len()
                );
                result
            }
            Err(err) => {
                warn!("bulk delete call failed entirely: {}", err);
                BatchDeleteResult {
                    deleted: Vec::new(),
                    failed: keys
                        .iter()
                        .map(|key| crate::storage::client::BatchDeleteError {
                            key: key.clone(),
                            message: err.to_string(),
                        })
                        .collect(),
                }
            }
        }
    }

    /// Copy within the bucket. Source existence is checked explicitly; the
    /// destination is re-read afterwards because the backend copy response is
    /// not assumed to carry full metadata.
    pub async fn copy(&self, source_key: &str, destination_key: &str) -> GatewayResult<FileRecord> {
        if !self.exists(source_key).await {
            return Err(GatewayError::NotFound(source_key.to_string()));
        }

        self.client
            .copy(&self.bucket, source_key, destination_key)
            .await?;
        info!("copied {} -> {}", source_key, destination_key);

        self.get_info(destination_key).await
    }
}
