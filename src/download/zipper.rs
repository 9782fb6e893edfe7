//! Bundles a folder of remote output files into one zip archive.
//!
//! The fetch fan-out is joined structurally: every fetch resolves to a
//! success or a failure, so a partial failure always terminates the
//! operation in an observable error state instead of stalling it. When any
//! file cannot be fetched the whole download fails and no archive is saved.

use crate::api::PortalClient;
use crate::download::listing::{entries_under, relative_key, OutputFileEntry};
use futures::future::join_all;
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("selected folder is {total_bytes} bytes, above the {limit_bytes} byte download limit")]
    BundleTooLarge { total_bytes: u64, limit_bytes: u64 },
    #[error("no files found under '{0}'")]
    EmptyFolder(String),
    #[error("download aborted, could not fetch: {}", .failures.join(", "))]
    FetchFailed { failures: Vec<String> },
    #[error("could not assemble archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("could not write archive: {0}")]
    Io(#[from] std::io::Error),
}

/// One file scheduled into a bundle, keyed by its path relative to the
/// bundle's folder root.
#[derive(Debug, Clone)]
pub struct BundleItem {
    pub relative_key: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct BundlePlan {
    pub folder: String,
    pub items: Vec<BundleItem>,
    pub total_bytes: u64,
}

/// Selects the files under `folder` and enforces the bundle size limit
/// before any network call is made.
pub fn plan_bundle(
    folder: &str,
    entries: &[OutputFileEntry],
    max_bundle_bytes: u64,
) -> Result<BundlePlan, DownloadError> {
    let selected = entries_under(folder, entries);
    if selected.is_empty() {
        return Err(DownloadError::EmptyFolder(folder.to_string()));
    }
    let total_bytes = selected.iter().map(|e| e.size).sum();
    if total_bytes > max_bundle_bytes {
        return Err(DownloadError::BundleTooLarge {
            total_bytes,
            limit_bytes: max_bundle_bytes,
        });
    }
    let items = selected
        .into_iter()
        .map(|e| BundleItem {
            relative_key: relative_key(folder, &e.key),
            url: e.url.clone(),
            size: e.size,
        })
        .collect();
    Ok(BundlePlan {
        folder: folder.to_string(),
        items,
        total_bytes,
    })
}

/// Serializes fetched files into a single in-memory zip archive.
pub fn write_archive(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>, DownloadError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (key, bytes) in files {
        writer.start_file(key.as_str(), options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

pub struct FolderZipper {
    client: PortalClient,
}

impl FolderZipper {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }

    /// Fetches every planned file in parallel, waits for all of them to
    /// settle, and builds the archive only when every fetch succeeded.
    pub async fn download(&self, plan: &BundlePlan) -> Result<Vec<u8>, DownloadError> {
        info!(
            folder = %plan.folder,
            files = plan.items.len(),
            total_bytes = plan.total_bytes,
            "starting folder download"
        );
        let fetches = plan.items.iter().map(|item| async move {
            match self.client.fetch_bytes(&item.url).await {
                Ok(bytes) => Ok((item.relative_key.clone(), bytes)),
                Err(e) => Err(format!("{} ({e})", item.relative_key)),
            }
        });
        let settled = join_all(fetches).await;

        let mut fetched = Vec::with_capacity(settled.len());
        let mut failures = Vec::new();
        for result in settled {
            match result {
                Ok(pair) => fetched.push(pair),
                Err(failure) => failures.push(failure),
            }
        }
        if !failures.is_empty() {
            warn!(folder = %plan.folder, failed = failures.len(), "folder download failed");
            return Err(DownloadError::FetchFailed { failures });
        }
        write_archive(&fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn listing() -> Vec<OutputFileEntry> {
        serde_json::from_str(
            r#"[
                {"key": "assembly/contigs.fasta", "url": "/files/1", "size": 600},
                {"key": "assembly/stats/report.txt", "url": "/files/2", "size": 300},
                {"key": "summary.html", "url": "/files/3", "size": 50}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn oversized_bundle_is_rejected_before_any_fetch() {
        let err = plan_bundle("assembly", &listing(), 500).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::BundleTooLarge {
                total_bytes: 900,
                limit_bytes: 500,
            }
        ));
    }

    #[test]
    fn plan_keys_files_relative_to_the_folder_root() {
        let plan = plan_bundle("assembly", &listing(), 10_000).unwrap();
        assert_eq!(plan.total_bytes, 900);
        let keys: Vec<_> = plan.items.iter().map(|i| i.relative_key.as_str()).collect();
        assert_eq!(keys, vec!["contigs.fasta", "stats/report.txt"]);
    }

    #[test]
    fn unknown_folder_yields_an_empty_folder_error() {
        let err = plan_bundle("no_such_dir", &listing(), 10_000).unwrap_err();
        assert!(matches!(err, DownloadError::EmptyFolder(_)));
    }

    #[test]
    fn archive_round_trips_one_entry_per_file() {
        let files = vec![
            ("contigs.fasta".to_string(), b">c1\nACGT\n".to_vec()),
            ("stats/report.txt".to_string(), b"n50\t1234\n".to_vec()),
        ];
        let bytes = write_archive(&files).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("stats/report.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "n50\t1234\n");
        assert!(archive.by_name("contigs.fasta").is_ok());
    }
}
