//! In-memory object-store backend.
//!
//! Non-persistent, mutex-guarded map. Used by the test suites and handy for
//! embedded or throwaway setups. Call counters and fault injection exist so
//! tests can assert which storage primitives were (or were not) reached.

use crate::models::presigned::PresignOperation;
use crate::storage::client::{
    BatchDeleteError, BatchDeleteResult, HeadObject, ListedObject, ObjectStoreClient, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

/// In-memory implementation of [`ObjectStoreClient`].
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    put_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    /// When set, `put` fails for any key containing this fragment.
    fail_put_matching: Mutex<Option<String>>,
    /// When set, `delete` fails for any key containing this fragment.
    fail_delete_matching: Mutex<Option<String>>,
    /// When set, `head` fails for any key containing this fragment.
    fail_head_matching: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `put` calls that reached the backend.
    pub fn put_count(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls (single or batched keys) that reached the
    /// backend.
    pub fn delete_count(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent `put` calls fail for keys containing `fragment`.
    pub fn fail_puts_matching(&self, fragment: impl Into<String>) {
        *self.fail_put_matching.lock().unwrap() = Some(fragment.into());
    }

    /// Make subsequent `delete` calls fail for keys containing `fragment`.
    pub fn fail_deletes_matching(&self, fragment: impl Into<String>) {
        *self.fail_delete_matching.lock().unwrap() = Some(fragment.into());
    }

    /// Make subsequent `head` calls fail for keys containing `fragment`.
    pub fn fail_heads_matching(&self, fragment: impl Into<String>) {
        *self.fail_head_matching.lock().unwrap() = Some(fragment.into());
    }

    fn should_fail(&self, switch: &Mutex<Option<String>>, key: &str) -> bool {
        switch
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|fragment| key.contains(fragment))
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> StoreResult<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(&self.fail_put_matching, key) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected put failure for `{key}`"
            )));
        }

        let etag = format!("{:x}", md5::compute(&data));
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.map(str::to_string),
                etag: etag.clone(),
                last_modified: Utc::now(),
                metadata,
            },
        );
        Ok(etag)
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| obj.data.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn head(&self, bucket: &str, key: &str) -> StoreResult<HeadObject> {
        if self.should_fail(&self.fail_head_matching, key) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected head failure for `{key}`"
            )));
        }
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| HeadObject {
                size: obj.data.len() as i64,
                content_type: obj.content_type.clone(),
                etag: obj.etag.clone(),
                last_modified: obj.last_modified,
                metadata: obj.metadata.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> StoreResult<Vec<ListedObject>> {
        let objects = self.objects.lock().unwrap();
        let mut listed: Vec<ListedObject> = objects
            .iter()
            .filter(|((b, key), _)| {
                b == bucket && prefix.is_none_or(|prefix| key.starts_with(prefix))
            })
            .map(|((_, key), obj)| ListedObject {
                key: key.clone(),
                size: obj.data.len() as i64,
                etag: obj.etag.clone(),
                last_modified: obj.last_modified,
            })
            .collect();
        listed.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listed)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(&self.fail_delete_matching, key) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected delete failure for `{key}`"
            )));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
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
        let mut objects = self.objects.lock().unwrap();
        let mut copied = objects
            .get(&(bucket.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source_key.to_string()))?;
        copied.last_modified = Utc::now();
        objects.insert((bucket.to_string(), dest_key.to_string()), copied);
        Ok(())
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        operation: PresignOperation,
        _content_type: Option<&str>,
        expires_in: Duration,
    ) -> StoreResult<String> {
        let expires = (Utc::now() + expires_in).timestamp();
        Ok(format!(
            "memory://{}/{}?expires={}&operation={}",
            bucket, key, expires, operation
        ))
    }
}
