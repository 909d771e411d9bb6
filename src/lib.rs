//! ente-timefix - Repair capture timestamps of exported media
//!
//! This library restores the capture time of photos and videos from the
//! JSON sidecars written next to them by photo export tools:
//! - Sidecar lookup by file name (`photo.jpg.json` or `photo.json`)
//! - Tolerant timestamp extraction from several JSON shapes
//! - EXIF date rewriting for images
//! - ffmpeg stream-copy rewriting of `creation_time` for videos
//! - Per-run counters and a failure ledger

pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod process;
pub mod report;
pub mod sidecar;
pub mod timestamp;

pub use cli::Cli;
pub use config::{Config, ConfigError, MediaKind};
pub use error::{Error, Result};
pub use metadata::{ExifCodec, FfmpegRewriter, ImageMetadataCodec, VideoRewriter};
pub use process::{FailedFile, ProcessingOutcome, Processor, RunStats};
pub use timestamp::ResolvedTimestamp;
