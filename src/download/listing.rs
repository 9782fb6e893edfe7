//! The flat output listing and the virtual folder tree derived from it.

use serde::Deserialize;
use std::collections::BTreeMap;

/// One file in a project's output, as reported by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputFileEntry {
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// A directory level of the virtual tree, keyed by child name for stable
/// ordering in the browser.
#[derive(Debug, Default)]
pub struct FolderNode {
    pub dirs: BTreeMap<String, FolderNode>,
    pub files: Vec<FileLeaf>,
}

#[derive(Debug, Clone)]
pub struct FileLeaf {
    pub name: String,
    pub size: u64,
    pub url: String,
}

/// Builds the browsable tree from the flat key list. Keys are `/`-separated
/// paths; empty segments are ignored.
pub fn build_tree(entries: &[OutputFileEntry]) -> FolderNode {
    let mut root = FolderNode::default();
    for entry in entries {
        let parts: Vec<&str> = entry.key.split('/').filter(|p| !p.is_empty()).collect();
        let Some((leaf, dirs)) = parts.split_last() else {
            continue;
        };
        let mut node = &mut root;
        for dir in dirs {
            node = node.dirs.entry((*dir).to_string()).or_default();
        }
        node.files.push(FileLeaf {
            name: (*leaf).to_string(),
            size: entry.size,
            url: entry.url.clone(),
        });
    }
    root
}

/// Entries whose key sits under `folder`. An empty folder selects the whole
/// listing; the folder's own prefix is matched on a path-segment boundary,
/// so `reads` does not capture `reads_qc/...`.
pub fn entries_under<'a>(folder: &str, entries: &'a [OutputFileEntry]) -> Vec<&'a OutputFileEntry> {
    let folder = folder.trim_matches('/');
    entries
        .iter()
        .filter(|e| {
            if folder.is_empty() {
                return true;
            }
            e.key
                .trim_start_matches('/')
                .strip_prefix(folder)
                .map_or(false, |rest| rest.starts_with('/'))
        })
        .collect()
}

/// The archive key for `key` inside a bundle rooted at `folder`.
pub fn relative_key(folder: &str, key: &str) -> String {
    let folder = folder.trim_matches('/');
    let key = key.trim_start_matches('/');
    if folder.is_empty() {
        return key.to_string();
    }
    key.strip_prefix(folder)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<OutputFileEntry> {
        serde_json::from_str(
            r#"[
                {"key": "assembly/contigs.fasta", "url": "/files/1", "size": 10},
                {"key": "assembly/stats/report.txt", "url": "/files/2", "size": 20},
                {"key": "reads_qc/trimmed.fastq.gz", "url": "/files/3", "size": 30},
                {"key": "summary.html", "url": "/files/4", "size": 5}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn tree_nests_directories_and_keeps_leaves() {
        let tree = build_tree(&listing());
        assert_eq!(tree.files.len(), 1);
        assert_eq!(tree.files[0].name, "summary.html");
        let assembly = &tree.dirs["assembly"];
        assert_eq!(assembly.files[0].name, "contigs.fasta");
        assert_eq!(assembly.dirs["stats"].files[0].name, "report.txt");
        assert_eq!(tree.dirs["reads_qc"].files[0].size, 30);
    }

    #[test]
    fn folder_filter_respects_segment_boundaries() {
        let entries = listing();
        let under = entries_under("assembly", &entries);
        assert_eq!(under.len(), 2);
        // A folder name that is a string prefix of another must not match it.
        let reads = entries_under("reads", &entries);
        assert!(reads.is_empty());
        assert_eq!(entries_under("", &entries).len(), 4);
    }

    #[test]
    fn relative_keys_are_rooted_at_the_folder() {
        assert_eq!(
            relative_key("assembly", "assembly/stats/report.txt"),
            "stats/report.txt"
        );
        assert_eq!(relative_key("", "summary.html"), "summary.html");
    }
}
