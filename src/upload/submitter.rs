//! Sends staged candidates to the portal, one multipart POST per file.
//!
//! All requests are issued in parallel and joined with an all-settle join:
//! a failed upload never blocks or rolls back its siblings, and the caller
//! clears the queue regardless of individual outcomes. Failures are purely
//! reported, one notice per file.

use crate::api::{ApiError, PortalClient};
use crate::upload::types::UploadCandidate;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// How one file's upload settled. `result` carries a display-ready message
/// on failure.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub local_id: u64,
    pub name: String,
    pub result: Result<(), String>,
}

/// Counts `(succeeded, failed)` over a settled batch.
pub fn summarize(outcomes: &[SubmitOutcome]) -> (usize, usize) {
    let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
    (succeeded, outcomes.len() - succeeded)
}

pub struct FileSubmitter {
    client: PortalClient,
}

impl FileSubmitter {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }

    /// Uploads every candidate concurrently and waits for all of them to
    /// settle. No concurrency cap, no short-circuit on first failure.
    /// `on_settle` fires once per candidate, as each upload finishes.
    pub async fn submit_all(
        &self,
        candidates: Vec<UploadCandidate>,
        on_settle: impl Fn(SubmitOutcome),
    ) -> Vec<SubmitOutcome> {
        let on_settle = &on_settle;
        let uploads = candidates.into_iter().map(|candidate| async move {
            let result = self.submit_one(&candidate).await;
            match &result {
                Ok(()) => info!(name = %candidate.name, "upload settled"),
                Err(e) => warn!(name = %candidate.name, error = %e, "upload failed"),
            }
            let outcome = SubmitOutcome {
                local_id: candidate.local_id,
                name: candidate.name,
                result: result.map_err(|e| e.to_string()),
            };
            on_settle(outcome.clone());
            outcome
        });
        join_all(uploads).await
    }

    async fn submit_one(&self, candidate: &UploadCandidate) -> Result<(), SubmitError> {
        let bytes = tokio::fs::read(&candidate.path).await?;
        self.client
            .upload_file(
                &candidate.name,
                &candidate.extension,
                candidate.size_bytes,
                bytes,
            )
            .await?;
        Ok(())
    }
}
