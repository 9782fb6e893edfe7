use serde::Deserialize;
use std::path::PathBuf;

/// Per-candidate lifecycle. `Done` and `Removed` are terminal; an `Error`
/// is surfaced to the user and then collapses to `Removed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    Queued,
    Uploading,
    Done,
    Error(String),
    Removed,
}

/// A file staged client-side for upload, not yet confirmed sent.
///
/// Owned exclusively by the in-memory [`UploadQueue`](super::UploadQueue);
/// never persisted.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub local_id: u64,
    pub path: PathBuf,
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
    /// Milliseconds since the Unix epoch; 0 when the filesystem has no mtime.
    pub last_modified: u64,
    pub status: CandidateStatus,
}

impl UploadCandidate {
    /// Whether this candidate counts towards the staged total the quota
    /// guard compares against the server-side limit.
    pub fn counts_toward_quota(&self) -> bool {
        matches!(
            self.status,
            CandidateStatus::Queued | CandidateStatus::Uploading
        )
    }

    /// Collision key for the duplicate detector.
    pub fn identity(&self) -> (&str, u64, &str, u64) {
        (
            self.name.as_str(),
            self.size_bytes,
            self.extension.as_str(),
            self.last_modified,
        )
    }
}

/// Server-reported storage limits. A read-only snapshot, superseded by each
/// refetch (on connect and after every submission).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageQuota {
    #[serde(rename = "uploadedSize")]
    pub used_bytes: u64,
    #[serde(rename = "maxStorageSizeBytes")]
    pub max_total_bytes: u64,
    #[serde(rename = "maxFileSizeBytes")]
    pub max_single_file_bytes: u64,
    #[serde(rename = "daysKept")]
    pub retention_days: u32,
}

impl StorageQuota {
    pub fn remaining_bytes(&self) -> u64 {
        self.max_total_bytes.saturating_sub(self.used_bytes)
    }
}
