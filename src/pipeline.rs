//! The organize → deduplicate → cleanup pipeline.
//!
//! Stages run strictly one after another. Within a stage, per-file work runs
//! on a rayon pool, and every per-file failure is reported and skipped. No
//! stage is rolled back when a later one has trouble: each filesystem change
//! is durable the moment it is made.

use crate::classifier::FolderRules;
use crate::cleanup::clean_up_empty_folders;
use crate::config::Config;
use crate::dedup::deduplicate;
use crate::entries;
use crate::error::{FileFixError, PipelineError};
use crate::events::{Event, EventSink, Stage};
use crate::mover::{FolderCounts, ensure_folders, move_into_folder};
use rayon::prelude::*;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Shared flag asking a run to stop before its next file operation.
///
/// Clones share the same flag, so one can be handed to a signal handler while
/// the pipeline polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Operations already in flight still complete.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Worker threads for per-file work; `None` uses rayon's default.
    pub workers: Option<usize>,
    /// Polled before every file operation.
    pub cancel: CancelFlag,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// When the run started, RFC 3339.
    pub started_at: String,
    /// Files moved into each configured folder.
    pub folder_counts: FolderCounts,
    /// Duplicate files deleted across all folders.
    pub duplicates_removed: usize,
    /// Empty folders removed from the download directory.
    pub empty_folders_removed: usize,
    /// Entries skipped because of an error, across all stages.
    pub failures: usize,
    /// True if the run stopped early on request.
    pub interrupted: bool,
    /// Wall-clock duration of the run.
    pub elapsed_secs: f64,
}

impl Summary {
    /// True when every stage ran to the end without a single skipped entry.
    pub fn is_clean(&self) -> bool {
        self.failures == 0 && !self.interrupted
    }
}

/// Outcome of the organize stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    pub counts: FolderCounts,
    pub failures: usize,
    pub interrupted: bool,
}

/// A move that [`organize_files`] would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub file: PathBuf,
    pub folder: String,
    pub destination: PathBuf,
    /// True if a file already sits at the destination and would be replaced.
    pub overwrites: bool,
}

enum MoveOutcome<'r> {
    Moved(&'r str),
    Unmatched,
    NotAFile,
    Failed,
    Cancelled,
}

/// Moves every matching top-level file of `source_dir` into its folder.
///
/// The directory is listed once; files that appear later are not picked up.
/// Unmatched files and non-files are left alone. Destination folders are
/// created before the listing is taken.
pub fn organize_files(
    rules: &FolderRules,
    source_dir: &Path,
    sink: &dyn EventSink,
    cancel: &CancelFlag,
) -> OrganizeReport {
    let started = Instant::now();
    let mut report = OrganizeReport {
        counts: FolderCounts::for_rules(rules),
        ..OrganizeReport::default()
    };

    if cancel.is_cancelled() {
        report.interrupted = true;
        return report;
    }

    for error in ensure_folders(source_dir, rules) {
        report.failures += 1;
        report_failure(sink, Stage::Organize, error);
    }

    let listing = match entries::snapshot(source_dir) {
        Ok(listing) => listing,
        Err(e) => {
            report.failures += 1;
            report_failure(sink, Stage::Organize, FileFixError::list(source_dir, e));
            return report;
        }
    };

    let total = listing.len();
    sink.emit(&Event::StageStarted {
        stage: Stage::Organize,
        scope: source_dir.to_path_buf(),
        total,
    });

    let processed = AtomicUsize::new(0);
    let outcomes: Vec<MoveOutcome> = listing
        .par_iter()
        .map(|entry| {
            if cancel.is_cancelled() {
                return MoveOutcome::Cancelled;
            }

            let outcome = if !entry.is_file {
                MoveOutcome::NotAFile
            } else {
                match rules.classify(&entry.name) {
                    None => MoveOutcome::Unmatched,
                    Some(folder) => match move_into_folder(&entry.path, &source_dir.join(folder)) {
                        Ok(destination) => {
                            sink.emit(&Event::FileMoved {
                                file: entry.path.clone(),
                                destination,
                                folder: folder.to_string(),
                                elapsed: started.elapsed(),
                            });
                            MoveOutcome::Moved(folder)
                        }
                        Err(e) => {
                            report_failure(sink, Stage::Organize, e);
                            MoveOutcome::Failed
                        }
                    },
                }
            };

            sink.emit(&Event::Progress {
                stage: Stage::Organize,
                processed: processed.fetch_add(1, Ordering::SeqCst) + 1,
                total,
                elapsed: started.elapsed(),
            });
            outcome
        })
        .collect();

    for outcome in outcomes {
        match outcome {
            MoveOutcome::Moved(folder) => report.counts.record(folder),
            MoveOutcome::Failed => report.failures += 1,
            MoveOutcome::Cancelled => report.interrupted = true,
            MoveOutcome::Unmatched | MoveOutcome::NotAFile => {}
        }
    }

    sink.emit(&Event::StageFinished {
        stage: Stage::Organize,
        scope: source_dir.to_path_buf(),
        elapsed: started.elapsed(),
    });

    report
}

/// Lists the moves [`organize_files`] would make, without touching anything.
pub fn plan_organize(rules: &FolderRules, source_dir: &Path) -> io::Result<Vec<PlannedMove>> {
    let planned = entries::snapshot(source_dir)?
        .into_iter()
        .filter(|entry| entry.is_file)
        .filter_map(|entry| {
            let folder = rules.classify(&entry.name)?;
            let destination = source_dir.join(folder).join(&entry.name);
            Some(PlannedMove {
                overwrites: destination.exists(),
                file: entry.path,
                folder: folder.to_string(),
                destination,
            })
        })
        .collect();
    Ok(planned)
}

/// Loads the configuration at `config_path` and runs the full pipeline.
///
/// # Errors
///
/// Returns `PipelineError::Config` if the configuration cannot be loaded or
/// is invalid. Nothing on disk has changed in that case.
pub fn run_from_file(
    config_path: &Path,
    options: &RunOptions,
    sink: &dyn EventSink,
) -> Result<Summary, PipelineError> {
    let config = Config::load(config_path)?;
    run(&config, options, sink)
}

/// Runs organize, then deduplicate for every folder, then cleanup.
///
/// Only worker-pool setup can fail; every later problem is counted in
/// [`Summary::failures`] and reported through `sink`.
///
/// # Examples
///
/// ```no_run
/// use filefix::config::Config;
/// use filefix::events::LogSink;
/// use filefix::pipeline::{RunOptions, run};
/// use std::path::Path;
///
/// let config = Config::load(Path::new("filefix.json")).unwrap();
/// let summary = run(&config, &RunOptions::default(), &LogSink).unwrap();
/// println!("moved {} files", summary.folder_counts.total());
/// ```
pub fn run(
    config: &Config,
    options: &RunOptions,
    sink: &dyn EventSink,
) -> Result<Summary, PipelineError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(workers) = options.workers {
        builder = builder.num_threads(workers);
    }
    let pool = builder
        .build()
        .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;

    Ok(pool.install(|| run_stages(config, &options.cancel, sink)))
}

fn run_stages(config: &Config, cancel: &CancelFlag, sink: &dyn EventSink) -> Summary {
    let started_at = chrono::Utc::now().to_rfc3339();
    let started = Instant::now();

    let organized = organize_files(&config.folders, &config.download_dir, sink, cancel);
    let mut failures = organized.failures;
    let mut interrupted = organized.interrupted;

    let mut duplicates_removed = 0;
    if !interrupted {
        for folder in config.folders.folder_names() {
            let report = deduplicate(folder, &config.folder_path(folder), sink, cancel);
            debug!(folder, scanned = report.scanned, removed = report.removed, "folder deduplicated");
            duplicates_removed += report.removed;
            failures += report.failures;
            if report.interrupted {
                interrupted = true;
                break;
            }
        }
    }

    let mut empty_folders_removed = 0;
    if !interrupted {
        let report = clean_up_empty_folders(&config.download_dir, sink, cancel);
        empty_folders_removed = report.removed.len();
        failures += report.failures;
        interrupted = report.interrupted;
    }

    let summary = Summary {
        started_at,
        folder_counts: organized.counts,
        duplicates_removed,
        empty_folders_removed,
        failures,
        interrupted,
        elapsed_secs: started.elapsed().as_secs_f64(),
    };
    sink.emit(&Event::Summary(summary.clone()));
    summary
}

fn report_failure(sink: &dyn EventSink, stage: Stage, error: FileFixError) {
    sink.emit(&Event::ItemFailed {
        stage,
        path: error.path().to_path_buf(),
        error: error.to_string(),
    });
}
