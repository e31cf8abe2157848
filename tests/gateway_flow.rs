//! End-to-end flow over the in-memory backend: upload a batch, inspect,
//! copy, presign, and delete, checking the partial-failure accounting along
//! the way.

use bytes::Bytes;
use chrono::{Duration, Utc};
use file_gateway::models::presigned::PresignOperation;
use file_gateway::routes::routes;
use file_gateway::models::upload::UploadFile;
use file_gateway::services::batch::BatchCoordinator;
use file_gateway::services::gateway::StorageGateway;
use file_gateway::services::presign::PresignedUrlManager;
use file_gateway::storage::MemoryStore;
use std::sync::Arc;

fn setup() -> (StorageGateway, BatchCoordinator, PresignedUrlManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let gateway = StorageGateway::new(store.clone(), "media", "http://localhost:3000");
    (
        gateway.clone(),
        BatchCoordinator::new(gateway.clone()),
        PresignedUrlManager::new(gateway),
        store,
    )
}

fn file(name: &str, content: &'static [u8]) -> UploadFile {
    UploadFile::new(name, None, Bytes::from_static(content))
}

#[test]
fn router_assembles_every_route() {
    // Registering handlers type-checks them against AppState.
    let _router = routes();
}

#[tokio::test]
async fn full_upload_inspect_copy_presign_delete_flow() {
    let (gateway, coordinator, presigner, _store) = setup();

    // Upload a batch with one invalid item in the middle.
    let result = coordinator
        .upload_all(vec![
            file("report.pdf", b"%PDF-1.4 report body"),
            file("malware.exe", b"MZ"),
            file("notes.txt", b"some notes"),
        ])
        .await
        .unwrap();

    assert!(result.is_fully_accounted());
    assert_eq!(result.succeeded.len(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].file_name, "malware.exe");

    // Stored records round-trip through retrieve and get_info.
    let report = result
        .succeeded
        .iter()
        .find(|r| r.file_name == "report.pdf")
        .unwrap();
    let bytes = gateway.retrieve(&report.key).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 report body");

    let info = gateway.get_info(&report.key).await.unwrap();
    assert_eq!(info.size, report.size);
    assert_eq!(info.e_tag, report.e_tag);
    assert_eq!(info.file_name, "report.pdf");
    assert_eq!(info.content_type, "application/pdf");

    // Listing sees exactly the two stored objects.
    let listed = gateway.list(None).await.unwrap();
    assert_eq!(listed.len(), 2);

    // Copy keeps the source and produces an equal-sized destination.
    let copied = gateway.copy(&report.key, "files/copies/report.pdf").await.unwrap();
    assert!(gateway.exists(&report.key).await);
    assert!(gateway.exists("files/copies/report.pdf").await);
    assert_eq!(copied.size, report.size);

    // Presign a download for an existing key.
    let grant = presigner
        .issue_for_download(&report.key, Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(grant.operation, PresignOperation::Get);
    assert_eq!(grant.validity_minutes, 30);
    assert!(grant.is_valid());
    assert!(!grant.is_valid_at(Utc::now() + Duration::minutes(31)));

    // Delete everything that was stored.
    let keys: Vec<String> = gateway
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.key)
        .collect();
    let summary = coordinator.delete_all(keys.clone()).await;
    assert_eq!(summary.total_requested, 3);
    assert_eq!(summary.deleted_count, 3);
    assert_eq!(summary.failed_count, 0);

    for key in keys {
        assert!(!gateway.exists(&key).await);
    }
}

#[tokio::test]
async fn batch_limit_violation_makes_no_storage_calls() {
    let (_, coordinator, _, store) = setup();

    let files: Vec<UploadFile> = (0..11).map(|i| {
        UploadFile::new(format!("f{i}.txt"), None, Bytes::from_static(b"x"))
    })
    .collect();

    assert!(coordinator.upload_all(files).await.is_err());
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn delete_all_on_empty_input_short_circuits() {
    let (_, coordinator, _, store) = setup();

    let summary = coordinator.delete_all(Vec::new()).await;

    assert_eq!(summary.total_requested, 0);
    assert_eq!(summary.deleted_count, 0);
    assert_eq!(summary.failed_count, 0);
    assert!(summary.failed_keys.is_empty());
    assert_eq!(store.delete_count(), 0);
}

#[tokio::test]
async fn presigned_upload_key_is_fresh_and_usable() {
    let (gateway, _, presigner, _) = setup();

    let grant = presigner
        .issue_for_upload("avatar.png", "image/png", Duration::minutes(15))
        .await
        .unwrap();

    assert_eq!(grant.operation, PresignOperation::Put);
    assert!(!gateway.exists(&grant.key).await);

    // Simulate the client PUT against the granted key, then inspect.
    gateway
        .store("avatar.png", &grant.key, Bytes::from_static(b"png bytes"), "image/png")
        .await
        .unwrap();
    let info = gateway.get_info(&grant.key).await.unwrap();
    assert_eq!(info.file_name, "avatar.png");
    assert_eq!(info.size, 9);
}
