//! Content-based duplicate removal inside a single folder.
//!
//! Digests are computed in parallel, but the keep-or-delete decision walks the
//! folder listing sequentially. The file that survives for each digest is
//! therefore always the one the filesystem listed first, independent of how
//! the hashing work was scheduled.

use crate::entries::{self, FileEntry};
use crate::error::FileFixError;
use crate::events::{Event, EventSink, Stage};
use crate::hasher::{self, ContentDigest};
use crate::pipeline::CancelFlag;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Outcome of deduplicating one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Regular files examined.
    pub scanned: usize,
    /// Duplicates deleted.
    pub removed: usize,
    /// Entries skipped because of an error.
    pub failures: usize,
    /// True if the pass stopped early because the run was cancelled.
    pub interrupted: bool,
}

/// Removes files in `folder_path` whose content matches an earlier-listed file.
///
/// Only the folder's immediate entries are considered. A file that cannot be
/// read is kept and reported; it never stops the pass. A folder that does not
/// exist has nothing to deduplicate.
pub fn deduplicate(
    folder_name: &str,
    folder_path: &Path,
    sink: &dyn EventSink,
    cancel: &CancelFlag,
) -> DedupReport {
    let mut report = DedupReport::default();
    let started = Instant::now();

    let listing = match entries::snapshot(folder_path) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(folder = folder_name, "folder missing, nothing to deduplicate");
            return report;
        }
        Err(e) => {
            report_failure(sink, FileFixError::list(folder_path, e));
            report.failures += 1;
            return report;
        }
    };

    let total = listing.len();
    sink.emit(&Event::StageStarted {
        stage: Stage::Deduplicate,
        scope: folder_path.to_path_buf(),
        total,
    });

    let digests = hash_files(&listing, cancel);
    let mut seen: HashSet<ContentDigest> = HashSet::new();

    for (processed, (entry, digest)) in listing.iter().zip(digests).enumerate() {
        if cancel.is_cancelled() {
            report.interrupted = true;
            break;
        }

        match digest {
            None => {}
            Some(Err(e)) => {
                report.scanned += 1;
                report.failures += 1;
                report_failure(sink, FileFixError::hash(&entry.path, e));
            }
            Some(Ok(digest)) => {
                report.scanned += 1;
                if !seen.insert(digest) {
                    match fs::remove_file(&entry.path) {
                        Ok(()) => {
                            report.removed += 1;
                            sink.emit(&Event::DuplicateRemoved {
                                file: entry.path.clone(),
                                folder: folder_name.to_string(),
                                digest,
                            });
                        }
                        Err(e) => {
                            report.failures += 1;
                            report_failure(sink, FileFixError::remove(&entry.path, e));
                        }
                    }
                }
            }
        }

        sink.emit(&Event::Progress {
            stage: Stage::Deduplicate,
            processed: processed + 1,
            total,
            elapsed: started.elapsed(),
        });
    }

    sink.emit(&Event::StageFinished {
        stage: Stage::Deduplicate,
        scope: folder_path.to_path_buf(),
        elapsed: started.elapsed(),
    });

    report
}

/// Hashes every regular file in `listing`, preserving listing positions.
///
/// `None` marks entries that are not regular files, or that were not hashed
/// because the run was cancelled.
fn hash_files(listing: &[FileEntry], cancel: &CancelFlag) -> Vec<Option<io::Result<ContentDigest>>> {
    listing
        .par_iter()
        .map(|entry| {
            if !entry.is_file || cancel.is_cancelled() {
                return None;
            }
            Some(hasher::digest(&entry.path))
        })
        .collect()
}

fn report_failure(sink: &dyn EventSink, error: FileFixError) {
    sink.emit(&Event::ItemFailed {
        stage: Stage::Deduplicate,
        path: error.path().to_path_buf(),
        error: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NoopSink, RecordingSink};
    use tempfile::TempDir;

    fn listed_names(dir: &Path) -> Vec<String> {
        entries::snapshot(dir)
            .unwrap()
            .into_iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_removes_later_listed_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path();
        fs::write(folder.join("one.jpg"), "same").unwrap();
        fs::write(folder.join("two.jpg"), "same").unwrap();
        fs::write(folder.join("three.jpg"), "same").unwrap();
        fs::write(folder.join("other.jpg"), "different").unwrap();

        let order = listed_names(folder);
        let first_same = order
            .iter()
            .find(|name| name.as_str() != "other.jpg")
            .unwrap()
            .clone();

        let report = deduplicate("images", folder, &NoopSink, &CancelFlag::new());

        assert_eq!(report.scanned, 4);
        assert_eq!(report.removed, 2);
        assert_eq!(report.failures, 0);
        let mut remaining = listed_names(folder);
        remaining.sort();
        let mut expected = vec![first_same, "other.jpg".to_string()];
        expected.sort();
        assert_eq!(remaining, expected);
    }

    #[test]
    fn test_distinct_files_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "b").unwrap();

        let report = deduplicate("docs", temp_dir.path(), &NoopSink, &CancelFlag::new());

        assert_eq!(report.removed, 0);
        assert_eq!(listed_names(temp_dir.path()).len(), 2);
    }

    #[test]
    fn test_subdirectories_are_not_scanned() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "same").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("a.txt"), "same").unwrap();

        let report = deduplicate("docs", temp_dir.path(), &NoopSink, &CancelFlag::new());

        assert_eq!(report.scanned, 1);
        assert_eq!(report.removed, 0);
        assert!(temp_dir.path().join("nested").join("a.txt").exists());
    }

    #[test]
    fn test_emits_removal_events() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.bin"), [1u8, 2, 3]).unwrap();
        fs::write(temp_dir.path().join("b.bin"), [1u8, 2, 3]).unwrap();
        let sink = RecordingSink::new();

        deduplicate("blobs", temp_dir.path(), &sink, &CancelFlag::new());

        let events = sink.events();
        let removed: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::DuplicateRemoved { folder, .. } => Some(folder.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec!["blobs"]);
        let progress = events
            .iter()
            .filter(|event| matches!(event, Event::Progress { .. }))
            .count();
        assert_eq!(progress, 2);
    }

    #[test]
    fn test_missing_folder_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();

        let report = deduplicate(
            "ghost",
            &temp_dir.path().join("ghost"),
            &NoopSink,
            &CancelFlag::new(),
        );

        assert_eq!(report, DedupReport::default());
    }

    #[test]
    fn test_cancelled_pass_deletes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "same").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "same").unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = deduplicate("docs", temp_dir.path(), &NoopSink, &cancel);

        assert!(report.interrupted);
        assert_eq!(report.removed, 0);
        assert_eq!(listed_names(temp_dir.path()).len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_kept_and_reported() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked.txt");
        fs::write(&locked, "same").unwrap();
        fs::write(temp_dir.path().join("open.txt"), "other").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::File::open(&locked).is_ok() {
            // Permissions are not enforced for this user (e.g. root).
            return;
        }

        let sink = RecordingSink::new();
        let report = deduplicate("docs", temp_dir.path(), &sink, &CancelFlag::new());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(report.removed, 0);
        assert!(locked.exists());
        assert!(temp_dir.path().join("open.txt").exists());
        assert!(sink.events().iter().any(|event| matches!(
            event,
            Event::ItemFailed { stage: Stage::Deduplicate, path, .. } if path == &locked
        )));
    }
}
