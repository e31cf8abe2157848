//! Shared application state handed to the router.

use crate::services::{batch::BatchCoordinator, gateway::StorageGateway, presign::PresignedUrlManager};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

/// Composition root of the gateway core.
///
/// Built once in `main` from an explicitly constructed store; handlers
/// receive clones. The pool and storage dir are kept only for the readiness
/// probe.
#[derive(Clone)]
pub struct AppState {
    pub gateway: StorageGateway,
    pub coordinator: BatchCoordinator,
    pub presigner: PresignedUrlManager,
    pub db: Arc<SqlitePool>,
    pub storage_dir: PathBuf,
}

impl AppState {
    pub fn new(gateway: StorageGateway, db: Arc<SqlitePool>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            coordinator: BatchCoordinator::new(gateway.clone()),
            presigner: PresignedUrlManager::new(gateway.clone()),
            gateway,
            db,
            storage_dir: storage_dir.into(),
        }
    }
}
