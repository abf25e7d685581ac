//! Removal of empty folders directly inside a directory.

use crate::entries;
use crate::error::FileFixError;
use crate::events::{Event, EventSink, Stage};
use crate::pipeline::CancelFlag;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Folders that were removed, in listing order.
    pub removed: Vec<PathBuf>,
    /// Entries skipped because of an error.
    pub failures: usize,
    /// True if the pass stopped early because the run was cancelled.
    pub interrupted: bool,
}

/// Removes every immediate subdirectory of `scope_dir` that is empty when scanned.
///
/// Single level only: nested folders are never inspected, and a folder that
/// only becomes empty because of this pass is left for the next run.
pub fn clean_up_empty_folders(
    scope_dir: &Path,
    sink: &dyn EventSink,
    cancel: &CancelFlag,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    let started = Instant::now();

    let listing = match entries::snapshot(scope_dir) {
        Ok(listing) => listing,
        Err(e) => {
            report_failure(sink, FileFixError::list(scope_dir, e));
            report.failures += 1;
            return report;
        }
    };

    let total = listing.len();
    sink.emit(&Event::StageStarted {
        stage: Stage::Cleanup,
        scope: scope_dir.to_path_buf(),
        total,
    });

    for (processed, entry) in listing.iter().enumerate() {
        if cancel.is_cancelled() {
            report.interrupted = true;
            break;
        }

        if entry.is_dir {
            match remove_if_empty(&entry.path) {
                Ok(true) => {
                    report.removed.push(entry.path.clone());
                    sink.emit(&Event::FolderRemoved {
                        folder: entry.path.clone(),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    report.failures += 1;
                    report_failure(sink, FileFixError::remove(&entry.path, e));
                }
            }
        }

        sink.emit(&Event::Progress {
            stage: Stage::Cleanup,
            processed: processed + 1,
            total,
            elapsed: started.elapsed(),
        });
    }

    sink.emit(&Event::StageFinished {
        stage: Stage::Cleanup,
        scope: scope_dir.to_path_buf(),
        elapsed: started.elapsed(),
    });

    report
}

/// Returns `Ok(false)` if the directory has any entry.
fn remove_if_empty(dir: &Path) -> io::Result<bool> {
    if fs::read_dir(dir)?.next().is_some() {
        return Ok(false);
    }
    // remove_dir refuses non-empty directories, so a file appearing after the
    // check above surfaces as an error instead of being deleted.
    fs::remove_dir(dir)?;
    Ok(true)
}

fn report_failure(sink: &dyn EventSink, error: FileFixError) {
    sink.emit(&Event::ItemFailed {
        stage: Stage::Cleanup,
        path: error.path().to_path_buf(),
        error: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NoopSink, RecordingSink};
    use tempfile::TempDir;

    #[test]
    fn test_removes_only_empty_folders() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir(base.join("empty")).unwrap();
        fs::create_dir(base.join("with_file")).unwrap();
        fs::write(base.join("with_file").join("keep.txt"), "k").unwrap();
        fs::create_dir_all(base.join("with_subdir").join("inner")).unwrap();
        fs::write(base.join("loose.txt"), "l").unwrap();

        let report = clean_up_empty_folders(base, &NoopSink, &CancelFlag::new());

        assert_eq!(report.removed, vec![base.join("empty")]);
        assert_eq!(report.failures, 0);
        assert!(!base.join("empty").exists());
        assert!(base.join("with_file").join("keep.txt").exists());
        // Only the top level is scanned; the nested empty folder stays.
        assert!(base.join("with_subdir").join("inner").is_dir());
        assert!(base.join("loose.txt").exists());
    }

    #[test]
    fn test_emits_folder_removed() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("docs")).unwrap();
        let sink = RecordingSink::new();

        clean_up_empty_folders(temp_dir.path(), &sink, &CancelFlag::new());

        assert!(sink.events().iter().any(|event| matches!(
            event,
            Event::FolderRemoved { folder } if folder.ends_with("docs")
        )));
    }

    #[test]
    fn test_missing_scope_is_a_failure() {
        let temp_dir = TempDir::new().unwrap();

        let report = clean_up_empty_folders(
            &temp_dir.path().join("missing"),
            &NoopSink,
            &CancelFlag::new(),
        );

        assert_eq!(report.failures, 1);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_cancelled_pass_removes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let report = clean_up_empty_folders(temp_dir.path(), &NoopSink, &cancel);

        assert!(report.interrupted);
        assert!(temp_dir.path().join("empty").exists());
    }
}
