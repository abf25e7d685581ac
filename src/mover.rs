//! Moving files into their destination folders.
//!
//! Destination folders are created once per run, before any file is moved.
//! A move into a folder that already holds a file with the same name replaces
//! it: the last writer wins, exactly as the platform's rename does.

use crate::classifier::FolderRules;
use crate::error::FileFixError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Number of files moved into each configured folder during one run.
///
/// Folders keep configuration order and start at zero, so a folder that
/// received nothing still shows up with a count of `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderCounts {
    counts: Vec<(String, usize)>,
}

impl FolderCounts {
    /// Creates a zeroed counter for every folder in `rules`.
    pub fn for_rules(rules: &FolderRules) -> Self {
        Self {
            counts: rules.folder_names().map(|name| (name.to_string(), 0)).collect(),
        }
    }

    /// Records one file moved into `folder`.
    pub fn record(&mut self, folder: &str) {
        match self.counts.iter_mut().find(|(name, _)| name == folder) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((folder.to_string(), 1)),
        }
    }

    /// Files moved into `folder`; zero for unknown folders.
    pub fn get(&self, folder: &str) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| name == folder)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Total number of files moved.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Iterates `(folder, count)` pairs in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

impl Serialize for FolderCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, count) in &self.counts {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Creates every configured folder inside `base_path`.
///
/// Creation is recursive and idempotent. Failures are returned rather than
/// raised so the caller can report them and still organize the other folders.
pub fn ensure_folders(base_path: &Path, rules: &FolderRules) -> Vec<FileFixError> {
    rules
        .folder_names()
        .filter_map(|folder| {
            let folder_path = base_path.join(folder);
            fs::create_dir_all(&folder_path)
                .err()
                .map(|e| FileFixError::directory_creation(&folder_path, e))
        })
        .collect()
}

/// Moves `file_path` into `folder_path`, keeping its file name.
///
/// Returns the destination path. An existing file at the destination is
/// overwritten. When the rename crosses filesystems the file is copied and
/// the source removed instead.
///
/// # Examples
///
/// ```no_run
/// use filefix::mover::move_into_folder;
/// use std::path::Path;
///
/// let result = move_into_folder(
///     Path::new("/home/me/Downloads/photo.jpg"),
///     Path::new("/home/me/Downloads/images"),
/// );
///
/// match result {
///     Ok(dest) => println!("Moved to {}", dest.display()),
///     Err(e) => eprintln!("Move failed: {}", e),
/// }
/// ```
pub fn move_into_folder(file_path: &Path, folder_path: &Path) -> Result<PathBuf, FileFixError> {
    let file_name = file_path.file_name().ok_or_else(|| {
        FileFixError::file_move(
            file_path,
            folder_path,
            io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
        )
    })?;
    let destination_path = folder_path.join(file_name);

    match fs::rename(file_path, &destination_path) {
        Ok(()) => Ok(destination_path),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(file_path, &destination_path)
                .map_err(|e| FileFixError::file_move(file_path, &destination_path, e))?;
            Ok(destination_path)
        }
        Err(e) => Err(FileFixError::file_move(file_path, &destination_path, e)),
    }
}

/// Copies `source` to `destination`, then removes `source`.
///
/// If `source` cannot be removed, the copy is deleted again so the file is
/// left only where it started.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}
