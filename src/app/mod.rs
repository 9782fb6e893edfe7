mod state;
mod ui;

pub use state::{AppState, Notice, NoticeLevel, TransferProgress, WorkerEvent};

use crate::api::{PortalClient, Session};
use crate::config::ClientConfig;
use crate::download::{build_tree, plan_bundle, FolderZipper};
use crate::upload::{
    summarize, AdmissionError, CandidateStatus, FileSubmitter, UploadQueue,
};
use crate::utils::curl_parser::CurlParser;
use crate::utils::file_size::format_size;
use eframe::{egui, App};
use ignore::Walk;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{info, warn};

pub struct EdgeUploader {
    curl_text: String,
    project_code: String,
    config: ClientConfig,
    session: Option<Session>,
    queue: UploadQueue,
    state: AppState,
    /// One channel for the whole app lifetime; every worker thread gets a
    /// clone of the sender, so events from overlapping workers all land.
    worker_tx: Sender<WorkerEvent>,
    worker_rx: Receiver<WorkerEvent>,
}

impl Default for EdgeUploader {
    fn default() -> Self {
        let (worker_tx, worker_rx) = channel();
        Self {
            curl_text: String::new(),
            project_code: String::new(),
            config: ClientConfig::default(),
            session: None,
            queue: UploadQueue::new(),
            state: AppState::default(),
            worker_tx,
            worker_rx,
        }
    }
}

impl EdgeUploader {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            config: ClientConfig::from_env(),
            ..Default::default()
        }
    }

    /// Parses the pasted cURL command into a session and kicks off the
    /// first quota/listing fetch.
    pub fn connect(&mut self) {
        match CurlParser::new().parse(&self.curl_text) {
            Ok(session) => {
                info!(base_url = %session.base_url, "session captured");
                self.session = Some(session);
                self.state.error_message = None;
                self.refresh_remote();
            }
            Err(e) => {
                self.state
                    .push_notice(Notice::error(format!("Could not read the curl command: {e}")));
            }
        }
    }

    /// Refetches the quota snapshot and, when a project code is set, the
    /// output listing. Runs on a worker thread like every network call.
    fn refresh_remote(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        let project_code = self.project_code.trim().to_string();
        let sender = self.worker_tx.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async move {
                let client = PortalClient::new(session);
                let quota = client.fetch_quota().await.map_err(|e| e.to_string());
                let _ = sender.send(WorkerEvent::QuotaFetched(quota));
                if !project_code.is_empty() {
                    let outputs = client
                        .fetch_outputs(&project_code)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = sender.send(WorkerEvent::OutputsFetched(outputs));
                }
            });
        });
    }

    pub fn add_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new().pick_files() {
            self.admit_paths(paths);
        }
    }

    pub fn add_folder(&mut self) {
        let Some(folder) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        let mut paths = Vec::new();
        for entry in Walk::new(&folder) {
            match entry {
                Ok(entry) => {
                    if entry.path().is_file() {
                        paths.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => warn!(error = %e, "error walking folder"),
            }
        }
        self.admit_paths(paths);
    }

    fn admit_paths(&mut self, paths: Vec<PathBuf>) {
        for path in paths {
            if let Err(e) = self
                .queue
                .add_path(&path, &self.config, self.state.quota.as_ref())
            {
                self.state.push_notice(Notice::error(e.to_string()));
            }
        }
        for name in self.queue.flag_duplicates() {
            self.state
                .push_notice(Notice::error(AdmissionError::Duplicate(name).to_string()));
        }
    }

    /// Confirms the submission: quota guard first (no network calls when it
    /// blocks, queue untouched), then one parallel POST per staged file.
    pub fn start_upload(&mut self) {
        if self.state.busy() {
            return;
        }
        let Some(session) = self.session.clone() else {
            self.state
                .push_notice(Notice::error("Paste a curl command and connect first"));
            return;
        };
        let Some(quota) = self.state.quota.clone() else {
            self.state
                .push_notice(Notice::error("Storage quota not loaded yet"));
            return;
        };
        if self.queue.staged_count() == 0 {
            self.state.push_notice(Notice::info("No files staged"));
            return;
        }
        if let Err(e) = self.queue.check_quota(&quota) {
            self.state.push_notice(Notice::error(e.to_string()));
            return;
        }

        let staged = self.queue.take_staged();
        let total = staged.len();
        self.state.is_uploading = true;
        self.state.error_message = None;
        self.state.progress = TransferProgress::Uploading {
            total,
            settled: 0,
            succeeded: 0,
            failed: 0,
        };
        let sender = self.worker_tx.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async move {
                let submitter = FileSubmitter::new(PortalClient::new(session));
                let settle_sender = sender.clone();
                let outcomes = submitter
                    .submit_all(staged, move |outcome| {
                        let _ = settle_sender.send(WorkerEvent::UploadSettled {
                            local_id: outcome.local_id,
                            name: outcome.name,
                            result: outcome.result,
                        });
                    })
                    .await;
                let (succeeded, failed) = summarize(&outcomes);
                info!(succeeded, failed, "submission settled");
                let _ = sender.send(WorkerEvent::UploadBatchDone);
            });
        });
    }

    /// Starts a folder download: the bundle plan enforces the size limit
    /// before a single fetch is issued.
    pub fn start_download(&mut self, folder: &str) {
        if self.state.busy() {
            return;
        }
        let Some(session) = self.session.clone() else {
            self.state
                .push_notice(Notice::error("Paste a curl command and connect first"));
            return;
        };
        let plan = match plan_bundle(folder, &self.state.outputs, self.config.max_bundle_bytes) {
            Ok(plan) => plan,
            Err(e) => {
                self.state.push_notice(Notice::error(e.to_string()));
                return;
            }
        };

        self.state.is_downloading = true;
        self.state.error_message = None;
        self.state.progress = TransferProgress::Downloading {
            folder: plan.folder.clone(),
            files: plan.items.len(),
            total_bytes: plan.total_bytes,
        };
        let sender = self.worker_tx.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async move {
                let zipper = FolderZipper::new(PortalClient::new(session));
                match zipper.download(&plan).await {
                    Ok(archive) => {
                        let _ = sender.send(WorkerEvent::BundleReady {
                            folder: plan.folder.clone(),
                            archive,
                        });
                    }
                    Err(e) => {
                        let _ = sender.send(WorkerEvent::BundleFailed {
                            folder: plan.folder.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            });
        });
    }

    /// Drains worker events into UI state. Returns whether anything changed.
    fn process_events(&mut self) -> bool {
        let mut events = Vec::new();
        while let Ok(event) = self.worker_rx.try_recv() {
            events.push(event);
        }
        let had_updates = !events.is_empty();

        for event in events {
            match event {
                WorkerEvent::QuotaFetched(Ok(quota)) => {
                    self.state.quota = Some(quota);
                }
                WorkerEvent::QuotaFetched(Err(e)) => {
                    self.state
                        .push_notice(Notice::error(format!("Could not load storage quota: {e}")));
                }
                WorkerEvent::OutputsFetched(Ok(entries)) => {
                    self.state.output_tree = build_tree(&entries);
                    self.state.outputs = entries;
                }
                WorkerEvent::OutputsFetched(Err(e)) => {
                    self.state
                        .push_notice(Notice::error(format!("Could not load output listing: {e}")));
                }
                WorkerEvent::UploadSettled {
                    local_id,
                    name,
                    result,
                } => {
                    if let TransferProgress::Uploading {
                        settled,
                        succeeded,
                        failed,
                        ..
                    } = &mut self.state.progress
                    {
                        *settled += 1;
                        match &result {
                            Ok(()) => *succeeded += 1,
                            Err(_) => *failed += 1,
                        }
                    }
                    match result {
                        Ok(()) => {
                            self.queue.mark(local_id, CandidateStatus::Done);
                            self.state
                                .push_notice(Notice::success(format!("{name} uploaded")));
                        }
                        Err(e) => {
                            self.queue
                                .mark(local_id, CandidateStatus::Error(e.clone()));
                            self.state.push_notice(Notice::error(format!("{name}: {e}")));
                        }
                    }
                }
                WorkerEvent::UploadBatchDone => {
                    if let TransferProgress::Uploading {
                        total,
                        succeeded,
                        failed,
                        ..
                    } = self.state.progress
                    {
                        self.state.progress = TransferProgress::Completed {
                            total,
                            succeeded,
                            failed,
                        };
                    }
                    // Report-only contract: the queue is cleared even when
                    // some uploads failed; each failure was already surfaced
                    // as its own notice.
                    self.queue.clear();
                    self.state.is_uploading = false;
                    self.state.needs_refresh = true;
                }
                WorkerEvent::BundleReady { folder, archive } => {
                    self.state.is_downloading = false;
                    self.state.progress = TransferProgress::Idle;
                    self.state.pending_archive = Some((folder, archive));
                }
                WorkerEvent::BundleFailed { folder, message } => {
                    self.state.is_downloading = false;
                    self.state.progress = TransferProgress::Idle;
                    self.state
                        .push_notice(Notice::error(format!("Download of '{folder}' failed: {message}")));
                }
            }
        }
        had_updates
    }

    /// Offers the save dialog for a finished bundle. Runs on the UI thread,
    /// once per bundle.
    fn save_pending_archive(&mut self) {
        let Some((folder, archive)) = self.state.pending_archive.take() else {
            return;
        };
        let stem = if folder.is_empty() {
            "project_outputs".to_string()
        } else {
            folder.replace('/', "_")
        };
        match rfd::FileDialog::new()
            .set_file_name(format!("{stem}.zip"))
            .save_file()
        {
            Some(path) => match std::fs::write(&path, &archive) {
                Ok(()) => {
                    self.state.push_notice(Notice::success(format!(
                        "Saved {} to {}",
                        format_size(archive.len() as u64),
                        path.display()
                    )));
                }
                Err(e) => {
                    self.state
                        .push_notice(Notice::error(format!("Could not save archive: {e}")));
                }
            },
            None => self.state.push_notice(Notice::info("Download discarded")),
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if self.process_events() || self.state.busy() {
            ctx.request_repaint();
        }
        if self.state.needs_refresh {
            self.state.needs_refresh = false;
            self.refresh_remote();
        }
        self.save_pending_archive();
    }
}

impl App for EdgeUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::OutputFileEntry;
    use crate::upload::StorageQuota;
    use reqwest::header::HeaderMap;
    use std::path::Path;

    fn session() -> Session {
        Session {
            base_url: "http://localhost".to_string(),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn blocked_submission_spawns_no_work_and_keeps_the_queue() {
        let mut app = EdgeUploader::default();
        app.session = Some(session());
        app.state.quota = Some(StorageQuota {
            used_bytes: 90,
            max_total_bytes: 100,
            ..Default::default()
        });
        app.queue
            .add_entry(Path::new("a.fastq"), "a.fastq", 50, 1, &app.config, None)
            .unwrap();

        app.start_upload();

        assert!(!app.state.is_uploading);
        assert!(app.worker_rx.try_recv().is_err(), "no worker was started");
        assert_eq!(app.queue.staged_count(), 1, "queue left untouched");
        assert!(app.state.error_message.is_some());
    }

    #[test]
    fn mixed_batch_yields_one_notice_per_file_and_one_reload() {
        let mut app = EdgeUploader::default();
        for (i, name) in ["a.fastq", "b.fastq", "c.fastq"].iter().enumerate() {
            app.queue
                .add_entry(Path::new(name), name, 10, i as u64, &app.config, None)
                .unwrap();
        }
        let staged = app.queue.take_staged();
        app.state.is_uploading = true;
        app.state.progress = TransferProgress::Uploading {
            total: staged.len(),
            settled: 0,
            succeeded: 0,
            failed: 0,
        };

        let sender = app.worker_tx.clone();
        sender
            .send(WorkerEvent::UploadSettled {
                local_id: 0,
                name: "a.fastq".to_string(),
                result: Ok(()),
            })
            .unwrap();
        sender
            .send(WorkerEvent::UploadSettled {
                local_id: 1,
                name: "b.fastq".to_string(),
                result: Err("server returned status 500".to_string()),
            })
            .unwrap();
        sender
            .send(WorkerEvent::UploadSettled {
                local_id: 2,
                name: "c.fastq".to_string(),
                result: Ok(()),
            })
            .unwrap();
        sender.send(WorkerEvent::UploadBatchDone).unwrap();

        assert!(app.process_events());

        assert_eq!(app.state.notices.len(), 3);
        let failures = app
            .state
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .count();
        assert_eq!(failures, 1);
        assert!(app.queue.is_empty(), "queue cleared despite the failure");
        assert!(!app.state.is_uploading);
        assert!(app.state.needs_refresh, "exactly one reload requested");
        assert!(matches!(
            app.state.progress,
            TransferProgress::Completed {
                total: 3,
                succeeded: 2,
                failed: 1,
            }
        ));
    }

    #[test]
    fn oversized_folder_download_issues_no_fetches() {
        let mut app = EdgeUploader::default();
        app.session = Some(session());
        app.config.max_bundle_bytes = 100;
        app.state.outputs = vec![OutputFileEntry {
            key: "big/blob.bin".to_string(),
            url: "/files/1".to_string(),
            size: 10_000,
        }];

        app.start_download("big");

        assert!(!app.state.is_downloading);
        assert!(app.worker_rx.try_recv().is_err(), "no worker was started");
        assert!(app.state.error_message.is_some());
    }

    #[test]
    fn download_request_is_ignored_while_an_upload_is_in_flight() {
        let mut app = EdgeUploader::default();
        app.session = Some(session());
        app.state.outputs = vec![OutputFileEntry {
            key: "reads_qc/report.txt".to_string(),
            url: "/files/1".to_string(),
            size: 10,
        }];
        app.state.is_uploading = true;
        app.state.progress = TransferProgress::Uploading {
            total: 1,
            settled: 0,
            succeeded: 0,
            failed: 0,
        };

        app.start_download("reads_qc");

        assert!(!app.state.is_downloading);
        assert!(app.worker_rx.try_recv().is_err(), "no worker was started");

        // The in-flight submission still terminates observably.
        app.worker_tx.send(WorkerEvent::UploadBatchDone).unwrap();
        assert!(app.process_events());
        assert!(!app.state.is_uploading);
        assert!(app.state.needs_refresh);
    }

    #[test]
    fn events_from_an_earlier_worker_land_after_a_later_one_starts() {
        let mut app = EdgeUploader::default();
        let refresh_sender = app.worker_tx.clone();
        let download_sender = app.worker_tx.clone();

        download_sender
            .send(WorkerEvent::BundleFailed {
                folder: "reads_qc".to_string(),
                message: "download aborted".to_string(),
            })
            .unwrap();
        refresh_sender
            .send(WorkerEvent::QuotaFetched(Ok(StorageQuota {
                used_bytes: 10,
                max_total_bytes: 100,
                ..Default::default()
            })))
            .unwrap();

        assert!(app.process_events());
        let quota = app.state.quota.as_ref().unwrap();
        assert_eq!(quota.used_bytes, 10, "the older worker's result was kept");
    }
}
