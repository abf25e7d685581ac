//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored one-line
//! messages, per-stage progress bars, and the final summary table. The
//! [`ConsoleSink`] turns pipeline events into that output.

use crate::events::{Event, EventSink, LogSink, Stage, display_name};
use crate::pipeline::{PlannedMove, Summary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for stages
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filefix::output::OutputFormatter;
    /// OutputFormatter::error("Configuration file not found");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for one stage.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of entries the stage will process
    /// * `label` - Text shown next to the bar
    pub fn create_progress_bar(total: u64, label: String) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb.set_prefix(label);
        pb
    }

    /// Prints the dry-run plan.
    pub fn plan(moves: &[PlannedMove]) {
        if moves.is_empty() {
            Self::info("No files would be moved.");
            return;
        }

        Self::header("DRY RUN: files would be organized as follows");
        for planned in moves {
            let mut line = format!(
                " - {} → {}/",
                display_name(&planned.file),
                planned.folder
            );
            if planned.overwrites {
                line.push_str(&format!(" {}", "(replaces existing file)".yellow()));
            }
            println!("{}", line);
        }
    }

    /// Prints a summary table with per-folder counts and run totals.
    ///
    /// Folders appear in configuration order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filefix::output::OutputFormatter;
    /// # fn show(summary: &filefix::pipeline::Summary) {
    /// OutputFormatter::summary_table(summary);
    /// # }
    /// ```
    pub fn summary_table(summary: &Summary) {
        Self::header("File counts:");

        let counts: Vec<_> = summary.folder_counts.iter().collect();
        let width = counts
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!("{:<width$} | {}", "Folder".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (folder, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        let total = summary.folder_counts.total();
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = width
        );

        Self::header("Summary report:");
        println!("Duplicates removed: {}", summary.duplicates_removed);
        println!("Empty folders removed: {}", summary.empty_folders_removed);
        println!("Elapsed: {:.2}s", summary.elapsed_secs);

        if summary.failures > 0 {
            Self::warning(&format!(
                "{} {} could not be processed; see the log above.",
                summary.failures,
                if summary.failures == 1 { "entry" } else { "entries" }
            ));
        }
        if summary.interrupted {
            Self::warning("Run interrupted before all stages finished.");
        } else if summary.failures == 0 {
            Self::success("Files organized, duplicates removed, empty folders cleaned up.");
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Renders events as progress bars and log lines.
///
/// One bar is shown per stage scope. Log records for moves, removals, and
/// failures are written through [`LogSink`] with the bar suspended so the two
/// never interleave on the terminal.
pub struct ConsoleSink {
    show_progress: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        match self.bar.lock() {
            Ok(mut bar) => f(&mut bar),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::StageStarted {
                stage,
                scope,
                total,
            } => {
                LogSink.emit(event);
                if !self.show_progress {
                    return;
                }
                let label = match stage {
                    Stage::Organize => "Organizing files".to_string(),
                    Stage::Deduplicate => {
                        format!("Removing duplicates from {}", display_name(scope))
                    }
                    Stage::Cleanup => "Cleaning up empty folders".to_string(),
                };
                let pb = OutputFormatter::create_progress_bar(*total as u64, label);
                self.with_bar(|bar| *bar = Some(pb));
            }
            // Workers report out of order; the bar only moves forward.
            Event::Progress { processed, .. } => self.with_bar(|bar| {
                if let Some(pb) = bar.as_ref() {
                    pb.set_position(pb.position().max(*processed as u64));
                }
            }),
            Event::StageFinished { elapsed, .. } => {
                self.with_bar(|bar| {
                    if let Some(pb) = bar.take() {
                        pb.finish_with_message(format!("Elapsed Time: {:.2}s", elapsed.as_secs_f64()));
                    }
                });
                LogSink.emit(event);
            }
            // The table printed by the CLI covers the summary.
            Event::Summary(_) => LogSink.emit(event),
            _ => self.with_bar(|bar| match bar.as_ref() {
                Some(pb) => pb.suspend(|| LogSink.emit(event)),
                None => LogSink.emit(event),
            }),
        }
    }
}
