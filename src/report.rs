//! End-of-run console report
//!
//! Prints the outcome counters and, when something failed, the failure
//! ledger. Colors follow a small fixed theme.

use crate::error::Error;
use crate::process::RunStats;
use crossterm::QueueableCommand;
use crossterm::style::{Color, Print, Stylize, style};
use std::io::{self, Write, stdout};

/// CLI theme colors
pub struct CliTheme;

impl CliTheme {
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const HINT: Color = Color::DarkGrey;
    pub const ACCENT: Color = Color::Cyan;
}

const WIDTH: usize = 40;

fn separator<W: Write + ?Sized>(out: &mut W, ch: char, width: usize) -> io::Result<()> {
    out.queue(Print(format!("{}\n", ch.to_string().repeat(width))))?;
    Ok(())
}

fn stat<W: Write + ?Sized>(out: &mut W, label: &str, value: usize, color: Color) -> io::Result<()> {
    out.queue(Print(format!("{}: ", label)))?;
    out.queue(Print(style(value).with(color).bold()))?;
    out.queue(Print("\n"))?;
    Ok(())
}

/// Write the summary and failure ledger for `stats`
pub fn write_report<W: Write + ?Sized>(out: &mut W, stats: &RunStats) -> io::Result<()> {
    out.queue(Print("\n"))?;
    separator(out, '=', WIDTH)?;
    out.queue(Print(format!("{}\n", "PROCESSING SUMMARY".bold())))?;
    separator(out, '=', WIDTH)?;

    stat(out, "Total files scanned", stats.processed, CliTheme::ACCENT)?;
    stat(out, "Successfully updated", stats.updated, CliTheme::SUCCESS)?;
    stat(out, "Failed", stats.failed, CliTheme::ERROR)?;
    stat(out, "Skipped (no JSON found)", stats.skipped_no_sidecar, CliTheme::WARNING)?;
    stat(out, "Skipped (no timestamp in JSON)", stats.skipped_no_timestamp, CliTheme::WARNING)?;

    if !stats.failures.is_empty() {
        out.queue(Print("\n"))?;
        separator(out, '=', WIDTH)?;
        out.queue(Print(format!("{}\n", "FAILED FILES LIST".bold())))?;
        separator(out, '=', WIDTH)?;

        for failure in &stats.failures {
            out.queue(Print(style("[FAILED] ").with(CliTheme::ERROR).bold()))?;
            out.queue(Print(format!("{}\n", failure.file_name())))?;
            out.queue(Print(format!("  Path: {}\n", failure.path.display())))?;
            out.queue(Print(format!("  Reason: {}\n", failure.reason)))?;
            separator(out, '-', 20)?;
        }
    }

    if stats.dry_run {
        out.queue(Print("\n"))?;
        out.queue(Print(style("⚠ ").with(CliTheme::WARNING).bold()))?;
        out.queue(Print("Dry run: no files were modified.\n"))?;
    }

    out.queue(Print("\nDone.\n"))?;
    out.flush()
}

/// Print the report to stdout
pub fn print_report(stats: &RunStats) -> io::Result<()> {
    write_report(&mut stdout().lock(), stats)
}

/// Print an error message
pub fn print_error(msg: &str) {
    let mut err = io::stderr();
    let _ = err.queue(Print(style("✗ ").with(CliTheme::ERROR).bold()));
    let _ = err.queue(Print(format!("{}\n", msg)));
    let _ = err.flush();
}

/// Print a hint message
pub fn print_hint(msg: &str) {
    let mut err = io::stderr();
    let _ = err.queue(Print(style("→ ").with(CliTheme::HINT)));
    let _ = err.queue(Print(format!("{}\n", msg)));
    let _ = err.flush();
}

/// Remedies printed after a fatal error
pub fn hints_for(error: &Error) -> &'static [&'static str] {
    match error {
        Error::ToolNotFound { .. } => &[
            "Videos cannot be processed without ffmpeg.",
            "To install: `brew install ffmpeg` (macOS) or `apt install ffmpeg` (Debian/Ubuntu)",
        ],
        Error::MissingDirectory(_) => &["Pass --root <DIR> or set root_dir in the configuration file."],
        _ => &[],
    }
}

/// Print the log file path
pub fn print_log_path(path: &str) {
    let mut out = stdout();
    let _ = out.queue(Print(style("Log file: ").with(CliTheme::HINT)));
    let _ = out.queue(Print(format!("{}\n", path)));
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FailedFile;
    use std::path::PathBuf;

    fn render(stats: &RunStats) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, stats).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_without_failures() {
        let stats = RunStats {
            processed: 3,
            updated: 2,
            skipped_no_sidecar: 1,
            ..RunStats::new()
        };
        let text = render(&stats);

        assert!(text.contains("PROCESSING SUMMARY"));
        assert!(text.contains("Total files scanned: "));
        assert!(text.contains("Skipped (no timestamp in JSON): "));
        assert!(!text.contains("FAILED FILES LIST"));
        assert!(!text.contains("Dry run"));
        assert!(text.trim_end().ends_with("Done."));
    }

    #[test]
    fn test_report_lists_failures() {
        let stats = RunStats {
            processed: 1,
            failed: 1,
            failures: vec![FailedFile {
                path: PathBuf::from("/export/album/clip.mov"),
                reason: "ffmpeg exited with an error: moov atom not found".into(),
            }],
            ..RunStats::new()
        };
        let text = render(&stats);

        assert!(text.contains("FAILED FILES LIST"));
        assert!(text.contains("clip.mov\n"));
        assert!(text.contains("  Path: /export/album/clip.mov\n"));
        assert!(text.contains("  Reason: ffmpeg exited with an error: moov atom not found\n"));
    }

    #[test]
    fn test_hints_for_fatal_errors() {
        let missing_tool = Error::ToolNotFound {
            program: "ffmpeg".into(),
        };
        assert!(hints_for(&missing_tool).iter().any(|h| h.contains("brew install ffmpeg")));
        assert!(hints_for(&Error::MissingDirectory(PathBuf::from("/x")))[0].contains("--root"));

        let per_file = Error::ExifWrite {
            path: PathBuf::from("a.jpg"),
            message: "corrupt".into(),
        };
        assert!(hints_for(&per_file).is_empty());
    }

    #[test]
    fn test_report_flags_dry_run() {
        let stats = RunStats {
            dry_run: true,
            ..RunStats::new()
        };
        assert!(render(&stats).contains("Dry run: no files were modified."));
    }
}
