//! Observer interface for pipeline progress and outcomes.
//!
//! The pipeline never prints or logs directly. It emits [`Event`]s to an
//! [`EventSink`] supplied by the caller, and behaves identically whether the
//! sink renders progress bars, writes log records, or discards everything.

use crate::hasher::ContentDigest;
use crate::pipeline::Summary;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Organize,
    Deduplicate,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Organize => "organize",
            Stage::Deduplicate => "deduplicate",
            Stage::Cleanup => "cleanup",
        })
    }
}

/// Something that happened during a run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A stage began scanning `scope`, which holds `total` entries.
    StageStarted {
        stage: Stage,
        scope: PathBuf,
        total: usize,
    },
    /// One more entry of the current scope was processed.
    Progress {
        stage: Stage,
        processed: usize,
        total: usize,
        elapsed: Duration,
    },
    /// A file was moved into its destination folder.
    FileMoved {
        file: PathBuf,
        destination: PathBuf,
        folder: String,
        elapsed: Duration,
    },
    /// A file was deleted because an earlier-listed file had the same digest.
    DuplicateRemoved {
        file: PathBuf,
        folder: String,
        digest: ContentDigest,
    },
    /// An empty folder was removed.
    FolderRemoved { folder: PathBuf },
    /// An entry was skipped after an error; the stage carried on.
    ItemFailed {
        stage: Stage,
        path: PathBuf,
        error: String,
    },
    /// A stage finished with `scope`.
    StageFinished {
        stage: Stage,
        scope: PathBuf,
        elapsed: Duration,
    },
    /// The run is over.
    Summary(Summary),
}

/// Receives pipeline events.
///
/// Sinks are shared across worker threads, so `emit` takes `&self`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn emit(&self, event: &Event) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &Event) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Writes events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::StageStarted {
                stage,
                scope,
                total,
            } => debug!(%stage, scope = %scope.display(), total, "stage started"),
            Event::Progress {
                stage,
                processed,
                total,
                elapsed,
            } => trace!(%stage, processed, total, elapsed_ms = elapsed.as_millis() as u64, "progress"),
            Event::FileMoved {
                file,
                destination,
                folder,
                elapsed,
            } => info!(
                destination = %destination.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Moved {} to {}",
                display_name(file),
                folder
            ),
            Event::DuplicateRemoved {
                file,
                folder,
                digest,
            } => info!(
                %digest,
                "Removed duplicate file {} from {}",
                display_name(file),
                folder
            ),
            Event::FolderRemoved { folder } => {
                info!("Removed empty folder {}", display_name(folder))
            }
            Event::ItemFailed { stage, path, error } => {
                warn!(%stage, path = %path.display(), "{}", error)
            }
            Event::StageFinished {
                stage,
                scope,
                elapsed,
            } => debug!(
                %stage,
                scope = %scope.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "stage finished"
            ),
            Event::Summary(summary) => info!(
                moved = summary.folder_counts.total(),
                duplicates_removed = summary.duplicates_removed,
                empty_folders_removed = summary.empty_folders_removed,
                failures = summary.failures,
                interrupted = summary.interrupted,
                "run finished"
            ),
        }
    }
}

/// The last path component, for messages that name a file inside a known folder.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
