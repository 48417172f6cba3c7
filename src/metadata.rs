//! Capture-time extraction and resolution.
//!
//! Originals are filed under the day they were taken, so the upload path needs
//! a timestamp. Embedded metadata can carry up to four candidates:
//!
//! | Field | EXIF source (via [`ExifExtractor`]) |
//! |---|---|
//! | `primary` | `DateTime` in IFD0 |
//! | `original` | `DateTimeOriginal` |
//! | `created` | `DateTimeDigitized` |
//! | `modified` | `DateTime` in IFD1 (the embedded-thumbnail directory) |
//!
//! ## Resolution priority
//!
//! The first non-empty candidate wins, in the order above:
//!
//! ```text
//! capture: resolve(&[primary, original, created, modified])
//! ```
//!
//! Only that one string is parsed. If it is malformed the metadata counts as
//! unusable and the caller falls through to its next date source; the other
//! three candidates are not consulted.
//!
//! Extraction failure is never fatal. Plenty of valid uploads (PNG screenshots,
//! stripped JPEGs) have no EXIF block at all.

use chrono::NaiveDateTime;
use std::io::Cursor;
use thiserror::Error;

/// The textual timestamp pattern shared by EXIF and caller-supplied hints.
pub const TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no metadata found")]
    NoMetadata,
    #[error("EXIF parse error: {0}")]
    Exif(#[from] exif::Error),
}

/// The four optional timestamp strings an extractor can report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureTimes {
    pub primary: Option<String>,
    pub original: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

impl CaptureTimes {
    /// The highest-priority non-empty candidate, unparsed.
    pub fn best(&self) -> Option<String> {
        resolve(&[
            self.primary.as_deref(),
            self.original.as_deref(),
            self.created.as_deref(),
            self.modified.as_deref(),
        ])
    }

    /// Parse the highest-priority candidate. `None` when no candidate is set
    /// or the chosen one does not match [`TIMESTAMP_FORMAT`].
    pub fn capture_time(&self) -> Option<NaiveDateTime> {
        self.best().as_deref().and_then(parse_timestamp)
    }
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Parse a `YYYY:MM:DD HH:MM:SS` timestamp.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Reads capture-time candidates out of raw image bytes.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, content: &[u8]) -> Result<CaptureTimes, MetadataError>;
}

/// EXIF extractor backed by `kamadak-exif`.
///
/// Works on any container the crate understands (JPEG, TIFF, PNG `eXIf`,
/// WebP, HEIF).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifExtractor;

impl ExifExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn ascii_field(exif: &exif::Exif, tag: exif::Tag, ifd: exif::In) -> Option<String> {
    exif.get_field(tag, ifd).and_then(|f| match &f.value {
        exif::Value::Ascii(v) if !v.is_empty() => std::str::from_utf8(&v[0])
            .ok()
            .map(|s| s.trim_end_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    })
}

impl MetadataExtractor for ExifExtractor {
    fn extract(&self, content: &[u8]) -> Result<CaptureTimes, MetadataError> {
        let exif = exif::Reader::new().read_from_container(&mut Cursor::new(content))?;

        let times = CaptureTimes {
            primary: ascii_field(&exif, exif::Tag::DateTime, exif::In::PRIMARY),
            original: ascii_field(&exif, exif::Tag::DateTimeOriginal, exif::In::PRIMARY),
            created: ascii_field(&exif, exif::Tag::DateTimeDigitized, exif::In::PRIMARY),
            modified: ascii_field(&exif, exif::Tag::DateTime, exif::In::THUMBNAIL),
        };
        if times == CaptureTimes::default() {
            return Err(MetadataError::NoMetadata);
        }
        Ok(times)
    }
}
