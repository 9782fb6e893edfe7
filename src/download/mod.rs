mod listing;
mod zipper;

pub use listing::{build_tree, FileLeaf, FolderNode, OutputFileEntry};
pub use zipper::{plan_bundle, BundlePlan, DownloadError, FolderZipper};
