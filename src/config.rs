//! Configuration types for the timestamp fixer

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kind of media a file is treated as, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Still image with an embedded EXIF block (jpg, tiff, webp)
    Image,
    /// Video container rewritten through ffmpeg (mp4, mov, ...)
    Video,
}

impl MediaKind {
    /// Human readable label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Configuration for the timestamp fixer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the exported library to repair
    pub root_dir: PathBuf,

    /// Extensions handled by the image writer (lowercase, no dot)
    pub image_extensions: Vec<String>,

    /// Extensions handled by the video writer (lowercase, no dot)
    pub video_extensions: Vec<String>,

    /// ffmpeg program name or absolute path
    pub ffmpeg_path: String,

    /// Resolve timestamps but never touch a file
    pub dry_run: bool,

    /// Also set the file modification time to the resolved timestamp
    pub set_file_mtime: bool,

    /// Follow symbolic links while walking the tree
    pub follow_links: bool,

    /// Directory for log files (defaults to `Log/` next to the executable)
    pub log_dir: Option<PathBuf>,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            image_extensions: vec!["jpg".into(), "jpeg".into(), "tiff".into(), "webp".into()],
            video_extensions: vec![
                "mp4".into(),
                "mov".into(),
                "m4v".into(),
                "avi".into(),
                "mkv".into(),
            ],
            ffmpeg_path: "ffmpeg".into(),
            dry_run: false,
            set_file_mtime: false,
            follow_links: false,
            log_dir: None,
            verbose: false,
        }
    }
}

/// `~/Downloads/ente_photos`, or a relative `Downloads/ente_photos` when no
/// home directory can be determined
pub fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
        .join("ente_photos")
}

/// Expand a leading `~` component to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl Config {
    /// Check if a file extension is handled by the image writer
    pub fn is_image(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.image_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Check if a file extension is handled by the video writer
    pub fn is_video(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.video_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Classify a path by its extension. `None` means the file is ignored.
    pub fn classify(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        if self.is_image(ext) {
            Some(MediaKind::Image)
        } else if self.is_video(ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.root_dir = expand_home(&config.root_dir);

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# ente-timefix configuration file
# This file uses TOML format (https://toml.io)

# Root of the exported library. Every file below it is visited.
root_dir = "~/Downloads/ente_photos"

# Extensions rewritten through the EXIF writer
image_extensions = ["jpg", "jpeg", "tiff", "webp"]

# Extensions rewritten through ffmpeg (stream copy, no re-encoding)
video_extensions = ["mp4", "mov", "m4v", "avi", "mkv"]

# ffmpeg program name (looked up in PATH) or absolute path
ffmpeg_path = "ffmpeg"

# Resolve timestamps and report, but do not modify any file
dry_run = false

# Also set each updated file's modification time to the capture time
set_file_mtime = false

# Follow symbolic links while scanning
follow_links = false

# Verbose output
verbose = false
"#
        .to_string()
    }
}

/// Accept `name`, `name.toml` or a full path for the config file
pub fn resolve_config_path(config_path: &Path) -> PathBuf {
    if config_path.exists() || config_path.extension().is_some() {
        return config_path.to_path_buf();
    }
    config_path.with_extension("toml")
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_classify_by_extension() {
        let config = Config::default();
        assert_eq!(config.classify(Path::new("a/photo.JPG")), Some(MediaKind::Image));
        assert_eq!(config.classify(Path::new("scan.tiff")), Some(MediaKind::Image));
        assert_eq!(config.classify(Path::new("clip.MoV")), Some(MediaKind::Video));
        assert_eq!(config.classify(Path::new("clip.mkv")), Some(MediaKind::Video));
        assert_eq!(config.classify(Path::new("photo.png")), None);
        assert_eq!(config.classify(Path::new("photo.jpg.json")), None);
        assert_eq!(config.classify(Path::new("README")), None);
        assert_eq!(config.classify(Path::new(".jpg")), None);
    }

    #[test]
    fn test_default_root_dir() {
        let root = default_root_dir();
        assert!(root.ends_with("Downloads/ente_photos"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/Pictures")), home.join("Pictures"));
        }
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timefix.toml");
        fs::write(
            &path,
            r#"
root_dir = "/data/export"
image_extensions = ["jpg"]
video_extensions = ["mov"]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
dry_run = true
follow_links = true
log_dir = "/var/log/timefix"
"#,
        )
        .unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        let expected = Config {
            root_dir: PathBuf::from("/data/export"),
            image_extensions: vec!["jpg".into()],
            video_extensions: vec!["mov".into()],
            ffmpeg_path: "/opt/ffmpeg/bin/ffmpeg".into(),
            dry_run: true,
            follow_links: true,
            log_dir: Some(PathBuf::from("/var/log/timefix")),
            ..Config::default()
        };
        assert_eq!(loaded, expected);
        assert_eq!(loaded.classify(Path::new("x.jpeg")), None);
    }

    #[test]
    fn test_resolve_config_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fix.toml"), "").unwrap();
        fs::write(dir.path().join("plain"), "").unwrap();

        // Bare name gets the .toml extension
        assert_eq!(resolve_config_path(&dir.path().join("fix")), dir.path().join("fix.toml"));
        // Existing files and names with an extension are used as given
        assert_eq!(resolve_config_path(&dir.path().join("plain")), dir.path().join("plain"));
        assert_eq!(resolve_config_path(&dir.path().join("fix.conf")), dir.path().join("fix.conf"));
        assert_eq!(resolve_config_path(Path::new("missing")), PathBuf::from("missing.toml"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "root_dir = \"/srv/photos\"\nset_file_mtime = true\n").unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.root_dir, PathBuf::from("/srv/photos"));
        assert!(loaded.set_file_mtime);
        assert_eq!(loaded.ffmpeg_path, "ffmpeg");
        assert!(loaded.is_video("m4v"));
    }

    #[test]
    fn test_sample_config_parses() {
        let parsed: Config = toml::from_str(&Config::sample_config()).unwrap();
        assert_eq!(parsed.image_extensions, Config::default().image_extensions);
        assert_eq!(parsed.video_extensions, Config::default().video_extensions);
    }

    #[test]
    fn test_parse_error_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "dry_run = maybe").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
