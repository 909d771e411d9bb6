//! Sidecar lookup and loading
//!
//! An exported media file may have a JSON companion describing when it was
//! really taken. Two naming conventions are recognised, checked in order:
//!
//! 1. `photo.jpg` -> `photo.jpg.json`
//! 2. `photo.jpg` -> `photo.json`
//!
//! Numbered duplicates such as `photo(1).jpg` are not matched to
//! `photo.jpg(1).json`; they simply report no sidecar.

use crate::error::{Error, Result};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Candidate sidecar paths for a media file, in lookup order
pub fn candidates(media_path: &Path) -> [PathBuf; 2] {
    let mut with_ext = OsString::from(media_path.as_os_str());
    with_ext.push(".json");

    [PathBuf::from(with_ext), media_path.with_extension("json")]
}

/// Locate the sidecar for `media_path`, first existing candidate wins
pub fn resolve(media_path: &Path) -> Option<PathBuf> {
    candidates(media_path).into_iter().find(|candidate| {
        let found = candidate.is_file();
        trace!(?candidate, found, "Checked sidecar candidate");
        found
    })
}

/// Read and parse a sidecar into a generic JSON tree.
///
/// No schema is applied here; any well-formed JSON document is accepted.
pub fn load(sidecar_path: &Path) -> Result<Value> {
    let bytes = fs::read(sidecar_path)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::SidecarParse {
        path: sidecar_path.to_path_buf(),
        source: e,
    })
}
