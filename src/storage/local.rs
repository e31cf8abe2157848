//! Local object-store backend: SQLite for metadata, disk for payloads.
//!
//! Payloads live beneath `base_path/{bucket}/{shard}/{shard}/{key}` with two
//! md5-derived shard levels to keep per-directory file counts down. Metadata
//! rows are upserted with overwrite semantics, matching how blob stores treat
//! repeated puts of the same key.

use crate::models::presigned::PresignOperation;
use crate::storage::client::{
    BatchDeleteError, BatchDeleteResult, HeadObject, ListedObject, ObjectStoreClient, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_KEY_LEN: usize = 1024;

/// One metadata row per stored object, keyed by `(bucket, key)`.
#[derive(Clone, Debug, FromRow)]
struct ObjectRow {
    key: String,
    size_bytes: i64,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
    metadata: Option<String>,
}

impl ObjectRow {
    fn metadata_map(&self) -> HashMap<String, String> {
        self.metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// SQLite-and-disk implementation of [`ObjectStoreClient`].
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<SqlitePool>,
    base_path: PathBuf,
    /// Root used when constructing object and presigned URLs.
    endpoint: String,
    /// Secret keyed into presigned-URL signatures.
    presign_secret: String,
}

impl LocalStore {
    pub fn new(
        db: Arc<SqlitePool>,
        base_path: impl Into<PathBuf>,
        endpoint: impl Into<String>,
        presign_secret: impl Into<String>,
    ) -> Self {
        Self {
            db,
            base_path: base_path.into(),
            endpoint: endpoint.into(),
            presign_secret: presign_secret.into(),
        }
    }

    /// Reject keys that could escape the payload directory.
    fn ensure_key_safe(&self, key: &str) -> StoreResult<()> {
        let invalid = key.is_empty()
            || key.len() > MAX_KEY_LEN
            || key.starts_with('/')
            || key.contains("..")
            || key
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0');
        if invalid {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "invalid object key `{key}`"
            )));
        }
        Ok(())
    }

    fn bucket_root(&self, bucket: &str) -> PathBuf {
        self.base_path.join(bucket)
    }

    /// Two-level shard identifiers from md5(bucket/key), `00`–`ff` each.
    fn shards(bucket: &str, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", bucket, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::shards(bucket, key);
        let mut path = self.bucket_root(bucket);
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    async fn fetch_row(&self, bucket: &str, key: &str) -> StoreResult<ObjectRow> {
        sqlx::query_as::<_, ObjectRow>(
            "SELECT key, size_bytes, content_type, etag, last_modified, metadata
             FROM objects WHERE bucket = ? AND key = ?",
        )
        .bind(bucket)
        .bind(key)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::NotFound(key.to_string()),
            other => StoreError::Backend(other.into()),
        })
    }

    async fn upsert_row(
        &self,
        bucket: &str,
        key: &str,
        size_bytes: i64,
        content_type: Option<&str>,
        etag: &str,
        last_modified: DateTime<Utc>,
        metadata_json: Option<String>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO objects (bucket, key, size_bytes, content_type, etag, last_modified, metadata)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(bucket, key) DO UPDATE SET
                 size_bytes = excluded.size_bytes,
                 content_type = excluded.content_type,
                 etag = excluded.etag,
                 last_modified = excluded.last_modified,
                 metadata = excluded.metadata",
        )
        .bind(bucket)
        .bind(key)
        .bind(size_bytes)
        .bind(content_type)
        .bind(etag)
        .bind(last_modified)
        .bind(metadata_json)
        .execute(&*self.db)
        .await
        .map_err(|err| StoreError::Backend(err.into()))?;
        Ok(())
    }

    /// Durably write `data` to `file_path` via a temp file and atomic rename.
    async fn write_payload(&self, file_path: &Path, data: &[u8]) -> StoreResult<()> {
        let parent = file_path.parent().ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("object path missing parent directory"))
        })?;
        fs::create_dir_all(parent)
            .await
            .map_err(|err| StoreError::Backend(err.into()))?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let write = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<(), io::Error>(())
        };
        if let Err(err) = write.await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Backend(err.into()));
        }

        if let Err(err) = fs::rename(&tmp_path, file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                let replace = async {
                    fs::remove_file(file_path).await?;
                    fs::rename(&tmp_path, file_path).await
                };
                replace
                    .await
                    .map_err(|err| StoreError::Backend(err.into()))?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Backend(err.into()));
            }
        }
        Ok(())
    }

    /// Remove empty shard directories upward until the bucket root.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }

    /// Escape `\`, `%` and `_` so a prefix matches literally under
    /// `LIKE ... ESCAPE '\'`. Underscores are legal in keys.
    fn escape_like(prefix: &str) -> String {
        let mut escaped = String::with_capacity(prefix.len());
        for c in prefix.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// Percent-encode a query parameter value. Unreserved characters pass
    /// through, everything else becomes `%XX`.
    fn encode_query_value(value: &str) -> String {
        let mut encoded = String::with_capacity(value.len());
        for byte in value.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    encoded.push(byte as char);
                }
                _ => encoded.push_str(&format!("%{:02X}", byte)),
            }
        }
        encoded
    }

    fn sign(
        &self,
        bucket: &str,
        key: &str,
        operation: PresignOperation,
        content_type: Option<&str>,
        expires: i64,
    ) -> String {
        let digest = md5::compute(format!(
            "{}:{}:{}:{}:{}:{}",
            self.presign_secret,
            bucket,
            key,
            operation,
            expires,
            content_type.unwrap_or("")
        ));
        format!("{:x}", digest)
    }
}

#[async_trait]
impl ObjectStoreClient for LocalStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StoreResult<String> {
        self.ensure_key_safe(key)?;

        let file_path = self.object_path(bucket, key);
        self.write_payload(&file_path, &data).await?;

        let etag = format!("{:x}", md5::compute(&data));
        let metadata_json = if metadata.is_empty() {
            None
        } else {
            serde_json::to_string(&metadata).ok()
        };
        let stored = self
            .upsert_row(
                bucket,
                key,
                data.len() as i64,
                content_type,
                &etag,
                Utc::now(),
                metadata_json,
            )
            .await;

        if let Err(err) = stored {
            let _ = fs::remove_file(&file_path).await;
            return Err(err);
        }

        debug!("stored {} bytes at {}/{}", data.len(), bucket, key);
        Ok(etag)
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        self.ensure_key_safe(key)?;
        self.fetch_row(bucket, key).await?;

        let file_path = self.object_path(bucket, key);
        match fs::read(&file_path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            // Metadata without a payload counts as absent.
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(StoreError::Backend(err.into())),
        }
    }

    async fn head(&self, bucket: &str, key: &str) -> StoreResult<HeadObject> {
        self.ensure_key_safe(key)?;
        let row = self.fetch_row(bucket, key).await?;
        Ok(HeadObject {
            size: row.size_bytes,
            content_type: row.content_type.clone(),
            etag: row.etag.clone(),
            last_modified: row.last_modified,
            metadata: row.metadata_map(),
        })
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ListedObject>> {
        let rows: Vec<ObjectRow> = match prefix {
            Some(prefix) => {
                sqlx::query_as(
                    "SELECT key, size_bytes, content_type, etag, last_modified, metadata
                     FROM objects WHERE bucket = ? AND key LIKE ? ESCAPE '\\' ORDER BY key ASC",
                )
                .bind(bucket)
                .bind(format!("{}%", Self::escape_like(prefix)))
                .fetch_all(&*self.db)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT key, size_bytes, content_type, etag, last_modified, metadata
                     FROM objects WHERE bucket = ? ORDER BY key ASC",
                )
                .bind(bucket)
                .fetch_all(&*self.db)
                .await
            }
        }
        .map_err(|err| StoreError::Backend(err.into()))?;

        Ok(rows
            .into_iter()
            .map(|row| ListedObject {
                key: row.key,
                size: row.size_bytes,
                etag: row.etag,
                last_modified: row.last_modified,
            })
            .collect())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.ensure_key_safe(key)?;
        sqlx::query("DELETE FROM objects WHERE bucket = ? AND key = ?")
            .bind(bucket)
            .bind(key)
            .execute(&*self.db)
            .await
            .map_err(|err| StoreError::Backend(err.into()))?;

        let file_path = self.object_path(bucket, key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed payload {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("payload {} already missing", file_path.display());
            }
            Err(err) => return Err(StoreError::Backend(err.into())),
        }

        if let Some(parent) = file_path.parent() {
            let bucket_root = self.bucket_root(bucket);
            self.prune_empty_dirs(parent, &bucket_root).await;
        }
        Ok(())
    }

    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> StoreResult<BatchDeleteResult> {
        let mut result = BatchDeleteResult::default();
        for key in keys {
            match self.delete(bucket, key).await {
                Ok(()) => result.deleted.push(key.clone()),
                Err(err) => result.failed.push(BatchDeleteError {
                    key: key.clone(),
                    message: err.to_string(),
                }),
            }
        }
        Ok(result)
    }

    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str) -> StoreResult<()> {
        self.ensure_key_safe(source_key)?;
        self.ensure_key_safe(dest_key)?;

        let source = self.fetch_row(bucket, source_key).await?;
        let data = self.get(bucket, source_key).await?;
        let dest_path = self.object_path(bucket, dest_key);
        self.write_payload(&dest_path, &data).await?;

        self.upsert_row(
            bucket,
            dest_key,
            source.size_bytes,
            source.content_type.as_deref(),
            &source.etag,
            Utc::now(),
            source.metadata.clone(),
        )
        .await?;

        debug!("copied {}/{} -> {}", bucket, source_key, dest_key);
        Ok(())
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        operation: PresignOperation,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> StoreResult<String> {
        self.ensure_key_safe(key)?;
        let expires = (Utc::now() + expires_in).timestamp();
        let signature = self.sign(bucket, key, operation, content_type, expires);

        let mut url = format!(
            "{}/{}/{}?expires={}&operation={}&signature={}",
            self.endpoint, bucket, key, expires, operation, signature
        );
        if let Some(ct) = content_type {
            url.push_str("&content-type=");
            url.push_str(&Self::encode_query_value(ct));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> (LocalStore, PathBuf) {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for stmt in include_str!("../../migrations/0001_init.sql")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(stmt).execute(&db).await.unwrap();
        }
        let dir = std::env::temp_dir().join(format!("file-gateway-test-{}", Uuid::new_v4()));
        let store = LocalStore::new(
            Arc::new(db),
            &dir,
            "http://localhost:3000",
            "test-secret",
        );
        (store, dir)
    }

    #[tokio::test]
    async fn put_then_get_and_head_round_trip() {
        let (store, dir) = store().await;
        let metadata = HashMap::from([("original-filename".to_string(), "a.pdf".to_string())]);

        let etag = store
            .put(
                "media",
                "files/2026/08/a-1a2b3c4d.pdf",
                Bytes::from_static(b"%PDF-1.4"),
                Some("application/pdf"),
                metadata,
            )
            .await
            .unwrap();

        let bytes = store.get("media", "files/2026/08/a-1a2b3c4d.pdf").await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4");

        let head = store.head("media", "files/2026/08/a-1a2b3c4d.pdf").await.unwrap();
        assert_eq!(head.size, 8);
        assert_eq!(head.etag, etag);
        assert_eq!(head.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            head.metadata.get("original-filename").map(String::as_str),
            Some("a.pdf")
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let (store, dir) = store().await;
        let err = store.get("media", "files/none.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn list_scopes_by_prefix() {
        let (store, dir) = store().await;
        for key in ["files/2026/07/a.txt", "files/2026/08/b.txt", "files/2026/08/c.txt"] {
            store
                .put("media", key, Bytes::from_static(b"x"), Some("text/plain"), HashMap::new())
                .await
                .unwrap();
        }

        let all = store.list("media", None).await.unwrap();
        assert_eq!(all.len(), 3);

        let august = store.list("media", Some("files/2026/08/")).await.unwrap();
        assert_eq!(august.len(), 2);
        assert!(august.iter().all(|o| o.key.starts_with("files/2026/08/")));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn list_prefix_matches_underscores_literally() {
        let (store, dir) = store().await;
        for key in ["files/a_b.txt", "files/aXb.txt"] {
            store
                .put("media", key, Bytes::from_static(b"x"), Some("text/plain"), HashMap::new())
                .await
                .unwrap();
        }

        let listed = store.list("media", Some("files/a_b")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "files/a_b.txt");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, dir) = store().await;
        store
            .put("media", "files/tmp.txt", Bytes::from_static(b"x"), None, HashMap::new())
            .await
            .unwrap();

        store.delete("media", "files/tmp.txt").await.unwrap();
        // Second delete of an absent key still succeeds.
        store.delete("media", "files/tmp.txt").await.unwrap();
        assert!(matches!(
            store.head("media", "files/tmp.txt").await.unwrap_err(),
            StoreError::NotFound(_)
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn copy_duplicates_payload_and_metadata() {
        let (store, dir) = store().await;
        let etag = store
            .put(
                "media",
                "files/src.txt",
                Bytes::from_static(b"hello"),
                Some("text/plain"),
                HashMap::from([("original-filename".into(), "src.txt".into())]),
            )
            .await
            .unwrap();

        store.copy("media", "files/src.txt", "files/dst.txt").await.unwrap();

        let src = store.head("media", "files/src.txt").await.unwrap();
        let dst = store.head("media", "files/dst.txt").await.unwrap();
        assert_eq!(src.size, dst.size);
        assert_eq!(dst.etag, etag);
        assert_eq!(
            dst.metadata.get("original-filename").map(String::as_str),
            Some("src.txt")
        );
        assert_eq!(&store.get("media", "files/dst.txt").await.unwrap()[..], b"hello");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn copy_missing_source_is_not_found() {
        let (store, dir) = store().await;
        let err = store.copy("media", "files/none.txt", "files/dst.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn presign_embeds_expiry_operation_and_signature() {
        let (store, dir) = store().await;
        let url = store
            .presign(
                "media",
                "files/a.pdf",
                PresignOperation::Get,
                None,
                Duration::minutes(30),
            )
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3000/media/files/a.pdf?"));
        assert!(url.contains("operation=GET"));
        assert!(url.contains("expires="));
        assert!(url.contains("signature="));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn presign_encodes_and_signs_the_content_type() {
        let (store, dir) = store().await;
        let with_ct = store
            .presign(
                "media",
                "files/a.bin",
                PresignOperation::Put,
                Some("application/x-b;q=1"),
                Duration::minutes(30),
            )
            .await
            .unwrap();
        let without_ct = store
            .presign(
                "media",
                "files/a.bin",
                PresignOperation::Put,
                None,
                Duration::minutes(30),
            )
            .await
            .unwrap();

        assert!(with_ct.contains("content-type=application%2Fx-b%3Bq%3D1"));

        // The content type participates in the signature.
        let signature = |url: &str| {
            url.split('&')
                .find(|p| p.starts_with("signature="))
                .unwrap()
                .to_string()
        };
        assert_ne!(signature(&with_ct), signature(&without_ct));

        let _ = std::fs::remove_dir_all(dir);
    }
}
