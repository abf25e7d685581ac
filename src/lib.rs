//! filefix - sort a downloads directory and tidy up after yourself
//!
//! This library moves files into folders by extension suffix, removes
//! duplicate files inside each folder by content digest, and prunes the empty
//! folders left behind. The pipeline reports what it does through an
//! [`EventSink`], so it runs the same with or without a terminal attached.

pub mod classifier;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod entries;
pub mod error;
pub mod events;
pub mod hasher;
pub mod logging;
pub mod mover;
pub mod output;
pub mod pipeline;

pub use classifier::FolderRules;
pub use config::{Config, ConfigError};
pub use error::{FileFixError, PipelineError};
pub use events::{Event, EventSink, LogSink, NoopSink, RecordingSink, Stage};
pub use hasher::ContentDigest;
pub use mover::FolderCounts;
pub use pipeline::{CancelFlag, RunOptions, Summary, organize_files, run, run_from_file};

pub use cli::{Cli, run_cli};
