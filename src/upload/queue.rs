//! The in-memory candidate queue: admission, duplicate detection, per-file
//! status tracking and the storage-quota guard.

use crate::config::ClientConfig;
use crate::upload::types::{CandidateStatus, StorageQuota, UploadCandidate};
use crate::upload::validate::{derive_extension, validate_candidate, AdmissionError};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;

#[derive(Debug, Default)]
pub struct UploadQueue {
    candidates: Vec<UploadCandidate>,
    next_id: u64,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// All candidates still visible to the user, in insertion order.
    pub fn visible(&self) -> impl Iterator<Item = &UploadCandidate> {
        self.candidates
            .iter()
            .filter(|c| c.status != CandidateStatus::Removed)
    }

    pub fn is_empty(&self) -> bool {
        self.visible().next().is_none()
    }

    pub fn staged_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Queued)
            .count()
    }

    /// Sum of sizes of all candidates that count against the quota. Always
    /// derived from the live queue, never tracked as a separate counter.
    pub fn staged_size(&self) -> u64 {
        self.candidates
            .iter()
            .filter(|c| c.counts_toward_quota())
            .map(|c| c.size_bytes)
            .sum()
    }

    /// Stats a file on disk and admits it through the validator.
    pub fn add_path(
        &mut self,
        path: &Path,
        config: &ClientConfig,
        quota: Option<&StorageQuota>,
    ) -> Result<u64, AdmissionError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let metadata = std::fs::metadata(path).map_err(|e| AdmissionError::Unreadable {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.add_entry(path, &name, metadata.len(), last_modified, config, quota)
    }

    /// Admits a candidate with explicit metadata. Split from [`add_path`]
    /// so the admission rules are testable without touching the filesystem.
    ///
    /// [`add_path`]: UploadQueue::add_path
    pub fn add_entry(
        &mut self,
        path: &Path,
        name: &str,
        size_bytes: u64,
        last_modified: u64,
        config: &ClientConfig,
        quota: Option<&StorageQuota>,
    ) -> Result<u64, AdmissionError> {
        validate_candidate(name, size_bytes, config, quota)?;
        let local_id = self.next_id;
        self.next_id += 1;
        self.candidates.push(UploadCandidate {
            local_id,
            path: path.to_path_buf(),
            name: name.to_string(),
            extension: derive_extension(name),
            size_bytes,
            last_modified,
            status: CandidateStatus::Queued,
        });
        debug!(name, size_bytes, "candidate queued");
        Ok(local_id)
    }

    /// Re-scans the whole queue for `(name, size, type, modified)` collisions
    /// and removes the later-added member of each colliding pair. Quadratic,
    /// which is fine at interactive file counts. Returns the names of the
    /// removed duplicates so the caller can notify the user.
    pub fn flag_duplicates(&mut self) -> Vec<String> {
        let mut flagged = Vec::new();
        for later in 1..self.candidates.len() {
            if self.candidates[later].status == CandidateStatus::Removed {
                continue;
            }
            let collides = self.candidates[..later].iter().any(|earlier| {
                earlier.status != CandidateStatus::Removed
                    && earlier.identity() == self.candidates[later].identity()
            });
            if collides {
                flagged.push(later);
            }
        }
        let mut removed = Vec::new();
        for index in flagged {
            self.candidates[index].status = CandidateStatus::Removed;
            removed.push(self.candidates[index].name.clone());
        }
        removed
    }

    /// The storage-quota guard: blocks submission when the staged total on
    /// top of the server-side usage would overflow the account limit. The
    /// queue is left untouched so the user can remove files and retry.
    pub fn check_quota(&self, quota: &StorageQuota) -> Result<(), AdmissionError> {
        let staged = self.staged_size();
        if quota.used_bytes.saturating_add(staged) > quota.max_total_bytes {
            return Err(AdmissionError::QuotaExceeded {
                needed_bytes: staged,
                available_bytes: quota.remaining_bytes(),
            });
        }
        Ok(())
    }

    /// Marks every queued candidate as uploading and returns the snapshot
    /// the submitter will send. Candidates added afterwards belong to the
    /// next submission.
    pub fn take_staged(&mut self) -> Vec<UploadCandidate> {
        let mut staged = Vec::new();
        for candidate in &mut self.candidates {
            if candidate.status == CandidateStatus::Queued {
                candidate.status = CandidateStatus::Uploading;
                staged.push(candidate.clone());
            }
        }
        staged
    }

    pub fn mark(&mut self, local_id: u64, status: CandidateStatus) {
        if let Some(candidate) = self
            .candidates
            .iter_mut()
            .find(|c| c.local_id == local_id)
        {
            candidate.status = status;
        }
    }

    /// User-initiated removal of a single staged file.
    pub fn remove(&mut self, local_id: u64) {
        self.mark(local_id, CandidateStatus::Removed);
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn queue_with(entries: &[(&str, u64, u64)]) -> UploadQueue {
        let config = ClientConfig::default();
        let mut queue = UploadQueue::new();
        for (name, size, modified) in entries {
            queue
                .add_entry(
                    &PathBuf::from(name),
                    name,
                    *size,
                    *modified,
                    &config,
                    None,
                )
                .unwrap();
        }
        queue
    }

    #[test]
    fn later_added_duplicate_is_the_one_removed() {
        let mut queue = queue_with(&[
            ("reads.fastq", 100, 5),
            ("other.fastq", 100, 5),
            ("reads.fastq", 100, 5),
        ]);
        let removed = queue.flag_duplicates();
        assert_eq!(removed, vec!["reads.fastq".to_string()]);
        // The earlier copy survives.
        let names: Vec<_> = queue.visible().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["reads.fastq", "other.fastq"]);
    }

    #[test]
    fn same_name_different_mtime_is_not_a_duplicate() {
        let mut queue = queue_with(&[("reads.fastq", 100, 5), ("reads.fastq", 100, 6)]);
        assert!(queue.flag_duplicates().is_empty());
        assert_eq!(queue.visible().count(), 2);
    }

    #[test]
    fn staged_size_is_derived_from_live_statuses() {
        let mut queue = queue_with(&[("a.fastq", 100, 1), ("b.fastq", 200, 2)]);
        assert_eq!(queue.staged_size(), 300);
        let id = queue.visible().next().unwrap().local_id;
        queue.remove(id);
        assert_eq!(queue.staged_size(), 200);
        queue.mark(1, CandidateStatus::Done);
        assert_eq!(queue.staged_size(), 0);
    }

    #[test]
    fn quota_guard_blocks_and_leaves_the_queue_untouched() {
        let mut queue = queue_with(&[("a.fastq", 300, 1), ("b.fastq", 300, 2)]);
        let quota = StorageQuota {
            used_bytes: 500,
            max_total_bytes: 1000,
            ..Default::default()
        };
        let err = queue.check_quota(&quota).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::QuotaExceeded {
                needed_bytes: 600,
                available_bytes: 500,
            }
        );
        assert_eq!(queue.visible().count(), 2);
        assert_eq!(queue.staged_size(), 600);

        let first_id = queue.visible().next().unwrap().local_id;
        queue.remove(first_id);
        assert!(queue.check_quota(&quota).is_ok());
    }

    #[test]
    fn take_staged_moves_queued_candidates_to_uploading() {
        let mut queue = queue_with(&[("a.fastq", 100, 1), ("b.fastq", 200, 2)]);
        let staged = queue.take_staged();
        assert_eq!(staged.len(), 2);
        assert!(queue
            .visible()
            .all(|c| c.status == CandidateStatus::Uploading));
        // Still counted by the quota guard while in flight.
        assert_eq!(queue.staged_size(), 300);
        assert!(queue.take_staged().is_empty());
    }

    #[test]
    fn rejected_files_never_enter_the_queue() {
        let config = ClientConfig::default();
        let mut queue = UploadQueue::new();
        let err = queue
            .add_entry(&PathBuf::from("empty.fastq"), "empty.fastq", 0, 1, &config, None)
            .unwrap_err();
        assert!(matches!(err, AdmissionError::EmptyFile(_)));
        assert!(queue.is_empty());
    }
}
