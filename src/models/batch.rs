//! Aggregated outcomes of multi-file operations.

use serde::{Deserialize, Serialize};

/// One item of a batch that could not be processed.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub file_name: String,
    pub reason: String,
}

/// Partitioned result of a batch operation.
///
/// Invariant: `succeeded.len() + failed.len() == attempted.len()`; each
/// attempted item lands in exactly one of the two partitions. Ordering of
/// the partitions follows the attempted order but is not otherwise
/// significant.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult<T> {
    /// Display names of every item the batch was asked to process.
    pub attempted: Vec<String>,

    /// Successfully processed items.
    pub succeeded: Vec<T>,

    /// Items that failed, each with a recorded reason.
    pub failed: Vec<BatchFailure>,
}

impl<T> BatchResult<T> {
    /// True when every attempted item is accounted for.
    pub fn is_fully_accounted(&self) -> bool {
        self.succeeded.len() + self.failed.len() == self.attempted.len()
    }
}

/// Summary of a batch delete, including which keys failed.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub total_requested: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub failed_keys: Vec<String>,
}

impl DeleteSummary {
    pub fn empty() -> Self {
        Self {
            total_requested: 0,
            deleted_count: 0,
            failed_count: 0,
            failed_keys: Vec::new(),
        }
    }
}
