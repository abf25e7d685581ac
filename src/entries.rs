//! Single-level directory snapshots.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One immediate child of a scanned directory.
///
/// Entries are ephemeral: every stage takes its own snapshot, and nothing is
/// remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Name of the entry within its directory.
    pub name: OsString,
    /// True for regular files. Symlinks and directories are false.
    pub is_file: bool,
    /// True for directories (not following symlinks).
    pub is_dir: bool,
}

/// Lists the immediate entries of `dir` in the filesystem's enumeration order.
///
/// The listing is a snapshot: entries created after this call are not seen.
/// Entries whose type cannot be determined (typically because they vanished
/// mid-listing) are reported as neither file nor directory, so every stage
/// skips them.
pub fn snapshot(dir: &Path) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let (is_file, is_dir) = entry
            .file_type()
            .map(|ft| (ft.is_file(), ft.is_dir()))
            .unwrap_or((false, false));

        entries.push(FileEntry {
            path: entry.path(),
            name: entry.file_name(),
            is_file,
            is_dir,
        });
    }

    Ok(entries)
}
