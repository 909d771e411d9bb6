//! EXIF date rewriting for images

use super::{ExifTimestamps, ImageMetadataCodec};
use crate::error::{Error, Result};
use crate::timestamp::ResolvedTimestamp;
use exif::{Field, In, Reader, Tag, Value};
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Codec backed by `little_exif` for writing and `kamadak-exif` for reading
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCodec;

impl ExifCodec {
    pub fn new() -> Self {
        Self
    }

    /// Existing metadata block, or an empty one if the file has none or it
    /// cannot be parsed
    fn load_or_empty(path: &Path) -> Metadata {
        match guarded(|| Metadata::new_from_path(path)) {
            Some(Ok(metadata)) => metadata,
            Some(Err(e)) => {
                debug!(?path, error = %e, "No readable EXIF block, starting from an empty one");
                Metadata::new()
            }
            None => {
                warn!(?path, "EXIF parser panicked, starting from an empty block");
                Metadata::new()
            }
        }
    }
}

impl ImageMetadataCodec for ExifCodec {
    fn write_timestamps(&self, path: &Path, formatted: &str) -> Result<()> {
        let mut metadata = Self::load_or_empty(path);

        metadata.set_tag(ExifTag::DateTimeOriginal(formatted.to_string()));
        metadata.set_tag(ExifTag::CreateDate(formatted.to_string()));
        metadata.set_tag(ExifTag::ModifyDate(formatted.to_string()));

        let write_error = |message: String| Error::ExifWrite {
            path: path.to_path_buf(),
            message,
        };
        match guarded(|| metadata.write_to_file(path)) {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(write_error(e.to_string())),
            None => {
                warn!(?path, "EXIF encoder panicked");
                Err(write_error("EXIF encoder panicked".to_string()))
            }
        }
    }

    fn read_timestamps(&self, path: &Path) -> Result<ExifTimestamps> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| Error::ExifRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let get = |tag: Tag| exif.get_field(tag, In::PRIMARY).and_then(ascii_value);

        Ok(ExifTimestamps {
            original: get(Tag::DateTimeOriginal),
            digitized: get(Tag::DateTimeDigitized),
            modified: get(Tag::DateTime),
        })
    }
}

fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

/// Run a codec call, turning a panic inside it into `None`.
///
/// The process-wide panic hook is left alone, so the panic message still
/// reaches stderr.
fn guarded<T>(op: impl FnOnce() -> T) -> Option<T> {
    panic::catch_unwind(AssertUnwindSafe(op)).ok()
}

/// Rewrite the three EXIF date fields of `path` to `timestamp`
pub fn write_image_timestamp<C: ImageMetadataCodec + ?Sized>(
    codec: &C,
    path: &Path,
    timestamp: &ResolvedTimestamp,
) -> Result<()> {
    let formatted = timestamp.exif_string();

    if let Ok(previous) = codec.read_timestamps(path) {
        trace!(?path, ?previous, "Current EXIF dates");
    }

    codec.write_timestamps(path, &formatted)?;
    info!(?path, date = %formatted, "Updated EXIF for image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    /// SOI, a JFIF APP0 segment and EOI: the smallest layout both EXIF
    /// libraries accept as a JPEG container
    const BARE_JPEG: &[u8] = &[
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
        0x00, // APP0
        0xFF, 0xD9, // EOI
    ];

    fn sample_timestamp() -> ResolvedTimestamp {
        ResolvedTimestamp::Naive(
            NaiveDate::from_ymd_opt(2021, 7, 4)
                .unwrap()
                .and_hms_opt(18, 5, 9)
                .unwrap(),
        )
    }

    #[test]
    fn test_round_trip_on_jpeg_without_exif() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, BARE_JPEG).unwrap();

        let codec = ExifCodec::new();
        assert!(codec.read_timestamps(&path).is_err());

        write_image_timestamp(&codec, &path, &sample_timestamp()).unwrap();

        let read = codec.read_timestamps(&path).unwrap();
        let expected = Some("2021:07:04 18:05:09".to_string());
        assert_eq!(read.original, expected);
        assert_eq!(read.digitized, expected);
        assert_eq!(read.modified, expected);
    }

    #[test]
    fn test_rewrite_replaces_previous_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpeg");
        fs::write(&path, BARE_JPEG).unwrap();

        let codec = ExifCodec::new();
        codec.write_timestamps(&path, "1999:12:31 23:59:59").unwrap();
        write_image_timestamp(&codec, &path, &sample_timestamp()).unwrap();

        let read = codec.read_timestamps(&path).unwrap();
        assert_eq!(read.original.as_deref(), Some("2021:07:04 18:05:09"));
        assert_eq!(read.modified.as_deref(), Some("2021:07:04 18:05:09"));
    }

    #[test]
    fn test_corrupt_image_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"this is plainly not an image file").unwrap();

        let err = write_image_timestamp(&ExifCodec::new(), &path, &sample_timestamp()).unwrap_err();
        assert!(matches!(err, Error::ExifWrite { .. }));
    }

    #[test]
    fn test_guarded_catches_panics() {
        assert_eq!(guarded(|| 7), Some(7));
        assert_eq!(guarded(|| -> u8 { panic!("malformed block") }), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.jpg");

        assert!(write_image_timestamp(&ExifCodec::new(), &path, &sample_timestamp()).is_err());
        assert!(!path.exists());
    }
}
