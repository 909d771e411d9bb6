//! Directory walker and run bookkeeping
//!
//! Handles the core loop of:
//! - Walking the export tree and classifying files by extension
//! - Pairing each media file with its sidecar
//! - Resolving a capture time and handing it to the matching writer
//! - Counting outcomes and keeping the failure ledger

use crate::config::{Config, MediaKind};
use crate::error::{Error, Result};
use crate::metadata::{ExifCodec, FfmpegRewriter, ImageMetadataCodec, VideoRewriter, write_timestamp};
use crate::sidecar;
use crate::timestamp::{self, ResolvedTimestamp};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use walkdir::{DirEntry, WalkDir};

/// Outcome of processing a single media file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Metadata was rewritten (or would have been, in a dry run)
    Updated,
    /// Sidecar parsing or the writer failed
    Failed,
    /// Neither `<name>.json` nor `<stem>.json` exists
    SkippedNoSidecar,
    /// The sidecar holds no usable timestamp
    SkippedNoTimestamp,
}

/// Entry of the failure ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl FailedFile {
    /// File name shown as the ledger heading
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Counters and failure ledger for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped_no_sidecar: usize,
    pub skipped_no_timestamp: usize,
    /// Failures in the order they happened
    pub failures: Vec<FailedFile>,
    /// The run did not modify any file
    pub dry_run: bool,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one media file
    pub fn record(&mut self, path: &Path, result: Result<ProcessingOutcome>) -> ProcessingOutcome {
        self.processed += 1;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.failures.push(FailedFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                ProcessingOutcome::Failed
            }
        };

        match outcome {
            ProcessingOutcome::Updated => self.updated += 1,
            ProcessingOutcome::Failed => self.failed += 1,
            ProcessingOutcome::SkippedNoSidecar => self.skipped_no_sidecar += 1,
            ProcessingOutcome::SkippedNoTimestamp => self.skipped_no_timestamp += 1,
        }

        outcome
    }

    /// Every processed file landed in exactly one bucket
    pub fn is_balanced(&self) -> bool {
        self.processed == self.updated + self.failed + self.skipped_no_sidecar + self.skipped_no_timestamp
    }

    pub fn summary(&self) -> String {
        format!(
            "Scanned: {}, Updated: {}, Failed: {}, No sidecar: {}, No timestamp: {}",
            self.processed, self.updated, self.failed, self.skipped_no_sidecar, self.skipped_no_timestamp
        )
    }
}

/// Walks an export tree and repairs capture times
pub struct Processor<C = ExifCodec, R = FfmpegRewriter> {
    config: Config,
    codec: C,
    rewriter: R,
}

impl<C: ImageMetadataCodec, R: VideoRewriter> Processor<C, R> {
    /// Create a new processor with the given configuration and writers
    pub fn new(config: Config, codec: C, rewriter: R) -> Self {
        Self {
            config,
            codec,
            rewriter,
        }
    }

    #[cfg(test)]
    fn codec(&self) -> &C {
        &self.codec
    }

    #[cfg(test)]
    fn rewriter(&self) -> &R {
        &self.rewriter
    }

    /// Process every media file under the configured root.
    ///
    /// Per-file errors land in the failure ledger. A fatal error (the root
    /// is missing, or ffmpeg can no longer be started) stops the walk and is
    /// returned instead.
    pub fn run(&self) -> Result<RunStats> {
        let root = &self.config.root_dir;
        let _span = span!(Level::INFO, "processor_run", root = %root.display()).entered();

        if !root.is_dir() {
            return Err(Error::MissingDirectory(root.clone()));
        }

        info!(dry_run = self.config.dry_run, "Scanning directory");

        let mut stats = RunStats::new();
        stats.dry_run = self.config.dry_run;

        for entry in WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !is_regular_file(&entry) {
                continue;
            }

            let path = entry.path();
            let Some(kind) = self.config.classify(path) else {
                continue;
            };

            match self.process_file(path, kind) {
                Err(e) if e.is_fatal() => {
                    error!(?path, error = %e, "Aborting run");
                    return Err(e);
                }
                result => {
                    if let Err(e) = &result {
                        error!(?path, error = %e, "Error processing file");
                    }
                    stats.record(path, result);
                }
            }
        }

        info!(summary = %stats.summary(), "Scan complete");
        Ok(stats)
    }

    /// Resolve, extract and write one media file.
    ///
    /// `Err` means the file failed; skips are `Ok` outcomes.
    pub fn process_file(&self, path: &Path, kind: MediaKind) -> Result<ProcessingOutcome> {
        let Some(sidecar_path) = sidecar::resolve(path) else {
            debug!(?path, "No sidecar found");
            return Ok(ProcessingOutcome::SkippedNoSidecar);
        };

        let record = sidecar::load(&sidecar_path)?;
        let Some(resolved) = timestamp::extract(&record)? else {
            debug!(?path, ?sidecar_path, "No valid timestamp found in sidecar");
            return Ok(ProcessingOutcome::SkippedNoTimestamp);
        };

        if self.config.dry_run {
            info!(?path, kind = kind.label(), timestamp = %resolved, "Would update");
            return Ok(ProcessingOutcome::Updated);
        }

        write_timestamp(kind, path, &resolved, &self.codec, &self.rewriter)?;

        if self.config.set_file_mtime {
            sync_mtime(path, &resolved);
        }

        Ok(ProcessingOutcome::Updated)
    }
}

/// Checks made before any file is touched: ffmpeg must be found first,
/// then the root must be a directory.
pub fn preflight(config: &Config) -> Result<FfmpegRewriter> {
    let rewriter = FfmpegRewriter::locate(&config.ffmpeg_path)?;
    if !config.root_dir.is_dir() {
        return Err(Error::MissingDirectory(config.root_dir.clone()));
    }
    Ok(rewriter)
}

/// Regular files, plus symlinks to regular files when links are not followed
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Set the modification time to the capture time. Failures are only logged.
fn sync_mtime(path: &Path, resolved: &ResolvedTimestamp) {
    let Some(time) = resolved.to_system_time() else {
        warn!(?path, timestamp = %resolved, "Capture time does not exist in the local zone, mtime unchanged");
        return;
    };

    if let Err(e) = filetime::set_file_mtime(path, filetime::FileTime::from_system_time(time)) {
        warn!(?path, error = %e, "Failed to set modification time");
    }
}
