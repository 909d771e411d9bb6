//! Error types for the timestamp fixer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for timestamp fixer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the timestamp fixer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse sidecar {path}: {source}")]
    SidecarParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Timestamp {value} from key '{key}' is out of range")]
    TimestampOutOfRange { key: &'static str, value: String },

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Failed to write EXIF data to {path}: {message}")]
    ExifWrite { path: PathBuf, message: String },

    #[error("Failed to rewrite video {path}: {message}")]
    VideoRewrite { path: PathBuf, message: String },

    #[error("{program} not found. Please install FFmpeg and ensure it is in PATH")]
    ToolNotFound { program: String },

    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ToolNotFound { .. } | Error::MissingDirectory(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MissingDirectory(PathBuf::from("/nope")).is_fatal());
        assert!(
            Error::ToolNotFound {
                program: "ffmpeg".into()
            }
            .is_fatal()
        );
        assert!(
            !Error::ExifWrite {
                path: PathBuf::from("a.jpg"),
                message: "corrupt".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_sidecar_parse_message_names_file() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = Error::SidecarParse {
            path: PathBuf::from("photo.jpg.json"),
            source,
        };
        assert!(err.to_string().starts_with("Failed to parse sidecar photo.jpg.json"));
    }
}
