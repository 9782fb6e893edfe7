//! Client-side configuration, read from the environment once at startup.

use std::env;

/// Comma-delimited list of upload extensions accepted by the portal.
pub const DEFAULT_ALLOWED_EXTENSIONS: &str = "fastq,fq,fasta,fa,fna,faa,contigs,\
fastq.gz,fq.gz,fasta.gz,fa.gz,fna.gz,gff,gff.gz,gbk,bed,txt,tsv,csv,xlsx,zip,raw,mzml,mzml.gz";

/// Maximum total size of a folder download bundle, in bytes (1 GiB).
pub const DEFAULT_MAX_BUNDLE_BYTES: u64 = 1_073_741_824;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub allowed_extensions: Vec<String>,
    pub max_bundle_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_values(DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_BUNDLE_BYTES)
    }
}

impl ClientConfig {
    /// Reads `EDGE_ALLOWED_EXTENSIONS` and `EDGE_MAX_BUNDLE_BYTES`, falling
    /// back to the compiled-in defaults when unset or unparseable.
    pub fn from_env() -> Self {
        let extensions = env::var("EDGE_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string());
        let max_bundle_bytes = env::var("EDGE_MAX_BUNDLE_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BUNDLE_BYTES);
        Self::from_values(&extensions, max_bundle_bytes)
    }

    fn from_values(extensions: &str, max_bundle_bytes: u64) -> Self {
        let allowed_extensions = extensions
            .split(',')
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            allowed_extensions,
            max_bundle_bytes,
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }
}
