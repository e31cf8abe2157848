//! Time-bounded direct-access grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation a presigned URL authorizes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresignOperation {
    Get,
    Put,
}

impl fmt::Display for PresignOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresignOperation::Get => write!(f, "GET"),
            PresignOperation::Put => write!(f, "PUT"),
        }
    }
}

/// A presigned URL together with its expiry bookkeeping.
///
/// Created once and never persisted or revoked by the gateway; expiry
/// enforcement belongs to the object store's signature verification.
/// Validity is a pure function of wall-clock time versus `expires_at`,
/// computed at read time and never cached.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlGrant {
    /// Display filename the grant refers to.
    pub file_name: String,

    /// Storage key the URL is signed for.
    pub key: String,

    /// The signed URL itself.
    pub url: String,

    /// Instant at which the signature stops being honored.
    pub expires_at: DateTime<Utc>,

    /// Requested validity window in minutes.
    pub validity_minutes: i64,

    /// Whether the URL authorizes a download (GET) or an upload (PUT).
    pub operation: PresignOperation,
}

impl PresignedUrlGrant {
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity evaluated against a supplied clock, for deterministic tests.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn minutes_remaining(&self) -> i64 {
        self.minutes_remaining_at(Utc::now())
    }

    /// Whole minutes left before expiry, zero once expired.
    pub fn minutes_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_valid_at(now) {
            return 0;
        }
        (self.expires_at - now).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant(expires_at: DateTime<Utc>) -> PresignedUrlGrant {
        PresignedUrlGrant {
            file_name: "report.pdf".into(),
            key: "files/2026/08/report-1a2b3c4d.pdf".into(),
            url: "http://localhost/signed".into(),
            expires_at,
            validity_minutes: 30,
            operation: PresignOperation::Get,
        }
    }

    #[test]
    fn valid_before_expiry_and_invalid_after() {
        let issued = Utc::now();
        let grant = grant(issued + Duration::minutes(30));

        assert!(grant.is_valid_at(issued));
        assert!(grant.is_valid_at(issued + Duration::minutes(29)));
        assert!(!grant.is_valid_at(issued + Duration::minutes(31)));
    }

    #[test]
    fn minutes_remaining_counts_down_to_zero() {
        let issued = Utc::now();
        let grant = grant(issued + Duration::minutes(30));

        assert_eq!(grant.minutes_remaining_at(issued), 30);
        assert_eq!(grant.minutes_remaining_at(issued + Duration::minutes(12)), 18);
        assert_eq!(grant.minutes_remaining_at(issued + Duration::minutes(45)), 0);
    }

    #[test]
    fn operation_serializes_uppercase() {
        let json = serde_json::to_string(&PresignOperation::Get).unwrap();
        assert_eq!(json, "\"GET\"");
        assert_eq!(PresignOperation::Put.to_string(), "PUT");
    }
}
