use crate::download::{FolderNode, OutputFileEntry};
use crate::upload::StorageQuota;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One user-visible notification. Every admission rejection and every
/// settled file produces exactly one.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Progress of the one transfer operation that may be in flight.
#[derive(Clone, Default)]
pub enum TransferProgress {
    #[default]
    Idle,
    Uploading {
        total: usize,
        settled: usize,
        succeeded: usize,
        failed: usize,
    },
    Downloading {
        folder: String,
        files: usize,
        total_bytes: u64,
    },
    Completed {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

impl TransferProgress {
    pub fn percentage(&self) -> f32 {
        match self {
            Self::Idle | Self::Downloading { .. } => 0.0,
            Self::Uploading { total, settled, .. } => {
                if *total == 0 {
                    0.0
                } else {
                    *settled as f32 / *total as f32
                }
            }
            Self::Completed { .. } => 1.0,
        }
    }

    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Uploading {
                total,
                settled,
                succeeded,
                failed,
            } => format!(
                "Uploading: {settled}/{total} files | Success: {succeeded} | Failed: {failed}"
            ),
            Self::Downloading {
                folder,
                files,
                total_bytes,
            } => format!(
                "Bundling '{folder}': {files} files, {}",
                crate::utils::file_size::format_size(*total_bytes)
            ),
            Self::Completed {
                total,
                succeeded,
                failed,
            } => format!(
                "Finished: {total} files | Success: {succeeded} | Failed: {failed}"
            ),
        }
    }
}

/// Messages sent from worker threads back to the UI thread.
pub enum WorkerEvent {
    QuotaFetched(Result<StorageQuota, String>),
    OutputsFetched(Result<Vec<OutputFileEntry>, String>),
    UploadSettled {
        local_id: u64,
        name: String,
        result: Result<(), String>,
    },
    /// Sent once per submission, after every upload has settled.
    UploadBatchDone,
    BundleReady {
        folder: String,
        archive: Vec<u8>,
    },
    BundleFailed {
        folder: String,
        message: String,
    },
}

#[derive(Default)]
pub struct AppState {
    pub quota: Option<StorageQuota>,
    pub outputs: Vec<OutputFileEntry>,
    pub output_tree: FolderNode,
    pub notices: Vec<Notice>,
    pub progress: TransferProgress,
    pub error_message: Option<String>,
    pub show_details: bool,
    pub is_uploading: bool,
    pub is_downloading: bool,
    /// Set when a settled submission should trigger the single
    /// quota/listing reload.
    pub needs_refresh: bool,
    /// A finished bundle waiting for the save dialog on the UI thread.
    pub pending_archive: Option<(String, Vec<u8>)>,
}

impl AppState {
    pub fn busy(&self) -> bool {
        self.is_uploading || self.is_downloading
    }

    pub fn push_notice(&mut self, notice: Notice) {
        if notice.level == NoticeLevel::Error {
            self.error_message = Some(notice.text.clone());
        }
        self.notices.push(notice);
    }
}
