//! Unpackaged files and empty directories under the prefix

pub mod dirs;
pub mod files;

pub use dirs::{build_tree, empty_directories, report_empty, DirectoryNode, References};
pub use files::unmanaged_files;
