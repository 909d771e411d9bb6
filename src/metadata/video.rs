//! Video creation time rewriting via ffmpeg

use super::{ToolOutput, VideoRewriter};
use crate::error::{Error, Result};
use crate::timestamp::ResolvedTimestamp;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

/// Stream-copies videos with the ffmpeg command line tool
#[derive(Debug, Clone)]
pub struct FfmpegRewriter {
    program: PathBuf,
}

impl FfmpegRewriter {
    /// Use `program` as given, without checking that it exists
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `program` in PATH (or accept it as an explicit path)
    pub fn locate(program: &str) -> Result<Self> {
        let resolved = which::which(program).map_err(|_| Error::ToolNotFound {
            program: program.to_string(),
        })?;
        debug!(program = %resolved.display(), "Found ffmpeg");
        Ok(Self::new(resolved))
    }
}

impl VideoRewriter for FfmpegRewriter {
    fn stream_copy(&self, input: &Path, output: &Path, creation_time: &str) -> Result<ToolOutput> {
        let result = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy"])
            .arg("-metadata")
            .arg(format!("creation_time={}", creation_time))
            .args(["-map_metadata", "0"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                // ffmpeg vanished after the preflight check
                io::ErrorKind::NotFound => Error::ToolNotFound {
                    program: self.program.display().to_string(),
                },
                _ => Error::VideoRewrite {
                    path: input.to_path_buf(),
                    message: format!("Failed to execute {}: {}", self.program.display(), e),
                },
            })?;

        Ok(ToolOutput {
            success: result.status.success(),
            diagnostics: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}

/// Sibling path the rewritten video is written to before it replaces the
/// original: `clip.mp4` -> `clip.mp4.temp.mp4`.
///
/// The original extension is repeated at the end so ffmpeg picks the same
/// container format for the output.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut temp = OsString::from(path.as_os_str());
    temp.push(".temp");
    if let Some(ext) = path.extension() {
        temp.push(".");
        temp.push(ext);
    }
    PathBuf::from(temp)
}

fn remove_temp(temp: &Path) {
    if temp.exists()
        && let Err(e) = fs::remove_file(temp)
    {
        warn!(?temp, error = %e, "Failed to remove temporary file");
    }
}

/// Last non-empty line of the tool output, which is where ffmpeg puts the
/// actual reason after its banner
fn summarize(diagnostics: &str) -> String {
    diagnostics
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string()
}

/// Set the container `creation_time` of `path` to `timestamp`.
///
/// The video is stream-copied into a temporary sibling which then replaces
/// the original by rename. On any failure the original is left as it was
/// and the temporary file is removed.
pub fn write_video_timestamp<R: VideoRewriter + ?Sized>(
    rewriter: &R,
    path: &Path,
    timestamp: &ResolvedTimestamp,
) -> Result<()> {
    let creation_time = timestamp.ffmpeg_string();
    let temp = temp_path(path);

    let output = match rewriter.stream_copy(path, &temp, &creation_time) {
        Ok(output) => output,
        Err(e) => {
            error!(?path, error = %e, "Failed to run video rewrite");
            remove_temp(&temp);
            return Err(e);
        }
    };

    if !output.success {
        error!(?path, diagnostics = %output.diagnostics.trim(), "ffmpeg failed");
        remove_temp(&temp);
        return Err(Error::VideoRewrite {
            path: path.to_path_buf(),
            message: format!("ffmpeg exited with an error: {}", summarize(&output.diagnostics)),
        });
    }

    if let Err(e) = fs::rename(&temp, path) {
        remove_temp(&temp);
        return Err(Error::VideoRewrite {
            path: path.to_path_buf(),
            message: format!("Failed to replace original with rewritten file: {}", e),
        });
    }

    info!(?path, creation_time = %creation_time, "Updated metadata for video");
    Ok(())
}
