//! Metadata writers
//!
//! This module rewrites the capture time stored inside media files:
//! - EXIF date fields in images, through an [`ImageMetadataCodec`]
//! - The `creation_time` container tag in videos, through a [`VideoRewriter`]
//!
//! Both capabilities are traits so the walker can be exercised without a
//! real codec or ffmpeg binary.

pub mod exif;
pub mod video;

use crate::config::MediaKind;
use crate::error::Result;
use crate::timestamp::ResolvedTimestamp;
use std::path::Path;

pub use self::exif::{ExifCodec, write_image_timestamp};
pub use self::video::{FfmpegRewriter, temp_path, write_video_timestamp};

/// The three EXIF date fields this tool rewrites, as raw strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifTimestamps {
    /// Exif IFD DateTimeOriginal (0x9003)
    pub original: Option<String>,
    /// Exif IFD DateTimeDigitized (0x9004)
    pub digitized: Option<String>,
    /// IFD0 DateTime (0x0132)
    pub modified: Option<String>,
}

/// Reads and writes the embedded metadata block of an image
pub trait ImageMetadataCodec {
    /// Set DateTimeOriginal, DateTimeDigitized and DateTime to `formatted`,
    /// keeping all other fields. An image without a metadata block gets a
    /// fresh one.
    fn write_timestamps(&self, path: &Path, formatted: &str) -> Result<()>;

    /// Read the three date fields back
    fn read_timestamps(&self, path: &Path) -> Result<ExifTimestamps>;
}

/// Result of one external stream-copy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the tool exited with status 0
    pub success: bool,
    /// Everything the tool printed to stderr
    pub diagnostics: String,
}

/// Re-muxes a video into a new container with an updated creation time
pub trait VideoRewriter {
    /// Copy every stream of `input` into `output` without re-encoding, set
    /// `creation_time`, carry over global metadata, overwrite `output`.
    ///
    /// `Err` is reserved for failing to run the tool at all.
    fn stream_copy(&self, input: &Path, output: &Path, creation_time: &str) -> Result<ToolOutput>;
}

/// Write `timestamp` into `path` with the writer matching `kind`
pub fn write_timestamp<C, R>(
    kind: MediaKind,
    path: &Path,
    timestamp: &ResolvedTimestamp,
    codec: &C,
    rewriter: &R,
) -> Result<()>
where
    C: ImageMetadataCodec + ?Sized,
    R: VideoRewriter + ?Sized,
{
    match kind {
        MediaKind::Image => write_image_timestamp(codec, path, timestamp),
        MediaKind::Video => write_video_timestamp(rewriter, path, timestamp),
    }
}
