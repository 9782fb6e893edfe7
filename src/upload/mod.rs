mod queue;
mod submitter;
mod types;
mod validate;

pub use queue::UploadQueue;
pub use submitter::{summarize, FileSubmitter, SubmitOutcome};
pub use types::{CandidateStatus, StorageQuota, UploadCandidate};
pub use validate::{derive_extension, AdmissionError};
