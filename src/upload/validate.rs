//! Pure admission predicates applied before a file enters the queue.

use crate::config::ClientConfig;
use crate::upload::types::StorageQuota;
use thiserror::Error;

/// Reasons a file is rejected client-side. None of these ever reach the
/// server; they are shown to the user and the file is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("{0}: empty files cannot be uploaded")]
    EmptyFile(String),
    #[error("{name}: file type '{extension}' is not accepted")]
    DisallowedExtension { name: String, extension: String },
    #[error("{name}: larger than the per-file limit of {limit_bytes} bytes")]
    FileTooLarge { name: String, limit_bytes: u64 },
    #[error("{0}: duplicate of a file already in the queue")]
    Duplicate(String),
    #[error("submission would exceed your storage quota ({needed_bytes} bytes needed, {available_bytes} available)")]
    QuotaExceeded {
        needed_bytes: u64,
        available_bytes: u64,
    },
    #[error("{name}: could not be read ({reason})")]
    Unreadable { name: String, reason: String },
}

/// Derives the extension used for validation and for the upload form's
/// `type` field. Gzipped names keep the compound suffix (`a.fastq.gz` ->
/// `fastq.gz`); a name with no dot yields the whole lower-cased name.
pub fn derive_extension(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let segments: Vec<&str> = lower.split('.').collect();
    match segments.as_slice() {
        [] | [_] => lower,
        [.., second_last, last] if *last == "gz" => format!("{second_last}.gz"),
        [.., last] => (*last).to_string(),
    }
}

/// Admission check for a single file. The per-file size limit is only
/// enforced once a quota snapshot has been fetched.
pub fn validate_candidate(
    name: &str,
    size_bytes: u64,
    config: &ClientConfig,
    quota: Option<&StorageQuota>,
) -> Result<(), AdmissionError> {
    if size_bytes == 0 {
        return Err(AdmissionError::EmptyFile(name.to_string()));
    }
    let extension = derive_extension(name);
    if !config.allows_extension(&extension) {
        return Err(AdmissionError::DisallowedExtension {
            name: name.to_string(),
            extension,
        });
    }
    if let Some(quota) = quota {
        if quota.max_single_file_bytes > 0 && size_bytes > quota.max_single_file_bytes {
            return Err(AdmissionError::FileTooLarge {
                name: name.to_string(),
                limit_bytes: quota.max_single_file_bytes,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_names_keep_the_compound_extension() {
        assert_eq!(derive_extension("sample.fastq.gz"), "fastq.gz");
        assert_eq!(derive_extension("Sample.FASTQ.GZ"), "fastq.gz");
        assert_eq!(derive_extension("reads.fq.gz"), "fq.gz");
    }

    #[test]
    fn plain_names_use_the_last_segment() {
        assert_eq!(derive_extension("a.b.TXT"), "txt");
        assert_eq!(derive_extension("reads.fastq"), "fastq");
    }

    #[test]
    fn dotless_names_yield_the_whole_name() {
        assert_eq!(derive_extension("README"), "readme");
        assert_eq!(derive_extension("Makefile"), "makefile");
    }

    #[test]
    fn zero_size_is_rejected_regardless_of_extension() {
        let config = ClientConfig::default();
        let err = validate_candidate("reads.fastq", 0, &config, None).unwrap_err();
        assert_eq!(err, AdmissionError::EmptyFile("reads.fastq".to_string()));
    }

    #[test]
    fn extension_outside_the_allow_list_is_rejected() {
        let config = ClientConfig::default();
        let err = validate_candidate("tool.exe", 10, &config, None).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::DisallowedExtension { extension, .. } if extension == "exe"
        ));
    }

    #[test]
    fn per_file_limit_applies_once_quota_is_known() {
        let config = ClientConfig::default();
        let quota = StorageQuota {
            max_single_file_bytes: 100,
            ..Default::default()
        };
        assert!(validate_candidate("reads.fastq", 1000, &config, None).is_ok());
        let err = validate_candidate("reads.fastq", 1000, &config, Some(&quota)).unwrap_err();
        assert!(matches!(err, AdmissionError::FileTooLarge { .. }));
    }
}
