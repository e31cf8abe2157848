//! Presigned-URL lifecycle.
//!
//! Depends only on the gateway's key-existence check and the client's
//! signing capability. Grants are never persisted or revoked here; the
//! store's signature verification enforces expiry.

use crate::errors::{GatewayError, GatewayResult};
use crate::models::presigned::{PresignOperation, PresignedUrlGrant};
use crate::services::gateway::StorageGateway;
use crate::services::keygen;
use chrono::{Duration, Utc};
use tracing::{debug, info};

#[derive(Clone)]
pub struct PresignedUrlManager {
    gateway: StorageGateway,
}

impl PresignedUrlManager {
    pub fn new(gateway: StorageGateway) -> Self {
        Self { gateway }
    }

    /// Sign a download URL for an existing object.
    ///
    /// Existence is checked before signing: an unsigned URL to a nonexistent
    /// object is useless, so the miss is rejected early instead of deferred
    /// to a client-side 404. Duration bounds are the boundary's concern.
    pub async fn issue_for_download(
        &self,
        key: &str,
        duration: Duration,
    ) -> GatewayResult<PresignedUrlGrant> {
        debug!("presigning download for {}", key);

        if !self.gateway.exists(key).await {
            return Err(GatewayError::NotFound(key.to_string()));
        }

        let url = self
            .gateway
            .client()
            .presign(
                self.gateway.bucket(),
                key,
                PresignOperation::Get,
                None,
                duration,
            )
            .await?;

        let expires_at = Utc::now() + duration;
        info!("presigned download for {} (expires {})", key, expires_at);

        Ok(PresignedUrlGrant {
            file_name: keygen::file_name_from_key(key).to_string(),
            key: key.to_string(),
            url,
            expires_at,
            validity_minutes: duration.num_minutes(),
            operation: PresignOperation::Get,
        })
    }

    /// Sign an upload URL for a fresh key derived from `file_name`.
    ///
    /// No existence check: uploads target a not-yet-existing key by
    /// construction.
    pub async fn issue_for_upload(
        &self,
        file_name: &str,
        content_type: &str,
        duration: Duration,
    ) -> GatewayResult<PresignedUrlGrant> {
        debug!("presigning upload for `{}`", file_name);

        let key = keygen::generate_key(file_name)?;
        let url = self
            .gateway
            .client()
            .presign(
                self.gateway.bucket(),
                &key,
                PresignOperation::Put,
                Some(content_type),
                duration,
            )
            .await?;

        let expires_at = Utc::now() + duration;
        info!("presigned upload for `{}` at {} (expires {})", file_name, key, expires_at);

        Ok(PresignedUrlGrant {
            file_name: file_name.to_string(),
            key,
            url,
            expires_at,
            validity_minutes: duration.num_minutes(),
            operation: PresignOperation::Put,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use bytes::Bytes;
    use std::sync::Arc;

    fn manager() -> (PresignedUrlManager, StorageGateway) {
        let store = Arc::new(MemoryStore::new());
        let gateway = StorageGateway::new(store, "media", "http://localhost:3000");
        (PresignedUrlManager::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn download_grant_for_existing_key() {
        let (manager, gateway) = manager();
        gateway
            .store("a.pdf", "files/a.pdf", Bytes::from_static(b"x"), "application/pdf")
            .await
            .unwrap();

        let grant = manager
            .issue_for_download("files/a.pdf", Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(grant.operation, PresignOperation::Get);
        assert_eq!(grant.validity_minutes, 30);
        assert_eq!(grant.file_name, "a.pdf");
        assert!(grant.is_valid());
        assert!(!grant.is_valid_at(Utc::now() + Duration::minutes(31)));
    }

    #[tokio::test]
    async fn download_grant_for_missing_key_is_rejected() {
        let (manager, _) = manager();
        let err = manager
            .issue_for_download("files/none.pdf", Duration::minutes(30))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn upload_grant_targets_a_fresh_key() {
        let (manager, _) = manager();
        let grant = manager
            .issue_for_upload("photo.png", "image/png", Duration::minutes(60))
            .await
            .unwrap();

        assert_eq!(grant.operation, PresignOperation::Put);
        assert_eq!(grant.file_name, "photo.png");
        assert!(grant.key.starts_with("files/"));
        assert!(grant.key.ends_with(".png"));
        assert_eq!(grant.validity_minutes, 60);
    }

    #[tokio::test]
    async fn upload_grant_with_blank_name_fails_validation() {
        let (manager, _) = manager();
        let err = manager
            .issue_for_upload("  ", "image/png", Duration::minutes(60))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidFile { .. }));
    }
}
