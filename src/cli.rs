//! CLI argument parsing with clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// ente-timefix - Repair capture times of exported photos and videos
///
/// Walks an export folder, reads the JSON sidecar next to every photo and
/// video, and writes the capture time it finds back into the file: EXIF
/// dates for images, the container creation_time for videos (via ffmpeg).
#[derive(Parser, Debug, Default)]
#[command(name = "ente-timefix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; command line arguments
    /// override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Root directory of the export to repair
    #[arg(short, long, env = "ENTE_TIMEFIX_ROOT")]
    pub root: Option<PathBuf>,

    /// ffmpeg program name or path
    #[arg(long)]
    pub ffmpeg: Option<String>,

    /// Dry run mode - resolve timestamps without modifying files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Also set each updated file's modification time
    #[arg(long)]
    pub set_mtime: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    pub follow_links: bool,

    /// Directory for log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log file as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref root) = self.root {
            config.root_dir = root.clone();
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            config.ffmpeg_path = ffmpeg.clone();
        }
        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.set_mtime {
            config.set_file_mtime = true;
        }
        if self.follow_links {
            config.follow_links = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
