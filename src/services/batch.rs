//! BatchCoordinator — multi-file operations with partial-failure accounting.
//!
//! The store has no multi-object transactions, so partial batch success is a
//! first-class, expected outcome: batch shape is validated fail-fast before
//! any I/O, then every item is attempted independently and its failure, if
//! any, is recorded rather than propagated.

use crate::errors::GatewayResult;
use crate::models::batch::{BatchFailure, BatchResult, DeleteSummary};
use crate::models::file_record::FileRecord;
use crate::models::upload::UploadFile;
use crate::services::gateway::StorageGateway;
use crate::services::{content_type, keygen, validation};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct BatchCoordinator {
    gateway: StorageGateway,
}

impl BatchCoordinator {
    pub fn new(gateway: StorageGateway) -> Self {
        Self { gateway }
    }

    /// Validate, key and store one file. Used for the single-upload path and
    /// for each batch item.
    pub async fn upload_one(&self, file: &UploadFile) -> GatewayResult<FileRecord> {
        validation::validate_one(file)?;

        let key = keygen::generate_key(&file.file_name)?;
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| content_type::resolve(&file.file_name).to_string());

        self.gateway
            .store(&file.file_name, &key, file.content.clone(), &content_type)
            .await
    }

    /// Upload a batch, best-effort per item.
    ///
    /// Batch limits (count, total size) are enforced fail-fast before any
    /// storage call; after that, one item's failure never aborts the rest.
    /// Items run concurrently; the batch cap of 10 is the concurrency bound.
    pub async fn upload_all(&self, files: Vec<UploadFile>) -> GatewayResult<BatchResult<FileRecord>> {
        debug!("starting batch upload of {} files", files.len());
        validation::validate_batch_limits(&files)?;

        let attempted: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        let outcomes =
            futures::future::join_all(files.iter().map(|file| self.upload_one(file))).await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (file_name, outcome) in attempted.iter().zip(outcomes) {
            match outcome {
                Ok(record) => succeeded.push(record),
                Err(err) => {
                    warn!("batch item `{}` failed: {}", file_name, err);
                    failed.push(BatchFailure {
                        file_name: file_name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            "batch upload finished: {} succeeded, {} failed of {}",
            succeeded.len(),
            failed.len(),
            attempted.len()
        );

        Ok(BatchResult {
            attempted,
            succeeded,
            failed,
        })
    }

    /// Delete a set of keys. Empty input short-circuits to a zero summary
    /// without any backend call.
    pub async fn delete_all(&self, keys: Vec<String>) -> DeleteSummary {
        if keys.is_empty() {
            return DeleteSummary::empty();
        }

        let outcome = self.gateway.delete_many(&keys).await;
        let summary = DeleteSummary {
            total_requested: keys.len(),
            deleted_count: outcome.deleted.len(),
            failed_count: outcome.failed.len(),
            failed_keys: outcome.failed.into_iter().map(|f| f.key).collect(),
        };

        info!(
            "batch delete finished: {} of {} deleted",
            summary.deleted_count, summary.total_requested
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatewayError;
    use crate::storage::memory::MemoryStore;
    use bytes::Bytes;
    use std::sync::Arc;

    fn coordinator() -> (BatchCoordinator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gateway = StorageGateway::new(store.clone(), "media", "http://localhost:3000");
        (BatchCoordinator::new(gateway), store)
    }

    fn file(name: &str) -> UploadFile {
        UploadFile::new(name, None, Bytes::from_static(b"content"))
    }

    #[tokio::test]
    async fn upload_all_records_invalid_item_without_aborting() {
        let (coordinator, _) = coordinator();
        let files = vec![file("one.pdf"), file("two.exe"), file("three.txt")];

        let result = coordinator.upload_all(files).await.unwrap();

        assert!(result.is_fully_accounted());
        assert_eq!(result.attempted.len(), 3);
        assert_eq!(result.succeeded.len(), 2);
        let succeeded: Vec<&str> = result.succeeded.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(succeeded, vec!["one.pdf", "three.txt"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].file_name, "two.exe");
        assert!(result.failed[0].reason.contains("exe"));
    }

    #[tokio::test]
    async fn oversized_batch_fails_fast_without_storage_calls() {
        let (coordinator, store) = coordinator();
        let files: Vec<_> = (0..11).map(|i| file(&format!("f{i}.txt"))).collect();

        let err = coordinator.upload_all(files).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidBatch(_)));
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn backend_fault_on_one_item_is_recorded_not_propagated() {
        let (coordinator, store) = coordinator();
        store.fail_puts_matching("flaky");

        let result = coordinator
            .upload_all(vec![file("solid.txt"), file("flaky.txt")])
            .await
            .unwrap();

        assert_eq!(result.succeeded.len(), 1);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].file_name, "flaky.txt");
    }

    #[tokio::test]
    async fn uploaded_items_get_distinct_keys() {
        let (coordinator, _) = coordinator();
        let result = coordinator
            .upload_all(vec![file("same.txt"), file("same.txt")])
            .await
            .unwrap();

        assert_eq!(result.succeeded.len(), 2);
        assert_ne!(result.succeeded[0].key, result.succeeded[1].key);
    }

    #[tokio::test]
    async fn delete_all_empty_input_skips_the_backend() {
        let (coordinator, store) = coordinator();

        let summary = coordinator.delete_all(Vec::new()).await;

        assert_eq!(summary.total_requested, 0);
        assert_eq!(summary.deleted_count, 0);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(store.delete_count(), 0);
    }

    #[tokio::test]
    async fn delete_all_reports_partial_failure_with_keys() {
        let (coordinator, store) = coordinator();
        for name in ["a.txt", "b.txt"] {
            coordinator.upload_one(&file(name)).await.unwrap();
        }
        let keys: Vec<String> = {
            let gateway = StorageGateway::new(store.clone(), "media", "http://localhost:3000");
            gateway
                .list(None)
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.key)
                .collect()
        };
        store.fail_deletes_matching(keygen::file_stem(keygen::file_name_from_key(&keys[1])));

        let summary = coordinator.delete_all(keys.clone()).await;

        assert_eq!(summary.total_requested, 2);
        assert_eq!(summary.deleted_count, 1);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.failed_keys, vec![keys[1].clone()]);
    }
}
