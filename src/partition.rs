//! Date partitioning of originals.
//!
//! Every original is stored under the calendar day it was captured:
//!
//! ```text
//! YYYY/MM/DD/<name>        e.g. 2023/05/01/photo.jpg
//! ```
//!
//! ## Date source precedence
//!
//! 1. **Metadata**: the highest-priority capture timestamp in the image
//!    (see [`CaptureTimes::capture_time`]).
//! 2. **Hint**: a caller-supplied `YYYY:MM:DD HH:MM:SS` string.
//! 3. **Clock**: local wall-clock time at upload.
//!
//! Each step only runs when the previous one produced nothing usable, so an
//! upload always ends up with a date and therefore a non-empty path.

use crate::metadata::{CaptureTimes, parse_timestamp};
use crate::storage::join_key;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

/// Where the partition date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Metadata,
    Hint,
    Clock,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateSource::Metadata => "metadata",
            DateSource::Hint => "hint",
            DateSource::Clock => "clock",
        })
    }
}

/// Pick the timestamp used to partition an upload.
///
/// `now` is only called when neither metadata nor the hint is usable.
pub fn resolve_capture_time(
    metadata: Option<&CaptureTimes>,
    hint: Option<&str>,
    now: impl FnOnce() -> NaiveDateTime,
) -> (NaiveDateTime, DateSource) {
    if let Some(t) = metadata.and_then(CaptureTimes::capture_time) {
        return (t, DateSource::Metadata);
    }
    if let Some(t) = hint.and_then(parse_timestamp) {
        return (t, DateSource::Hint);
    }
    (now(), DateSource::Clock)
}

/// The `YYYY/MM/DD` directory for a day.
pub fn date_dir(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}

/// Whether `name` can be filed under a day directory.
///
/// Names may contain `/` (they become nested keys) but must have at least one
/// real segment and may not climb out of the day directory with `..`.
pub fn is_valid_name(name: &str) -> bool {
    let segments: Vec<&str> = name
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    !segments.is_empty() && !segments.contains(&"..")
}

/// Build the storage key `YYYY/MM/DD/<name>`.
pub fn partition_path(time: NaiveDateTime, name: &str) -> String {
    join_key(&[date_dir(time.date()).as_str(), name])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn fixed_now() -> NaiveDateTime {
        at("2030:07:04 12:00:00")
    }

    fn meta(primary: Option<&str>, original: Option<&str>) -> CaptureTimes {
        CaptureTimes {
            primary: primary.map(String::from),
            original: original.map(String::from),
            ..CaptureTimes::default()
        }
    }

    #[test]
    fn photo_with_primary_capture_time() {
        let m = meta(Some("2023:05:01 10:00:00"), None);
        let (t, source) = resolve_capture_time(Some(&m), None, fixed_now);
        assert_eq!(source, DateSource::Metadata);
        assert_eq!(partition_path(t, "photo.jpg"), "2023/05/01/photo.jpg");
    }

    #[test]
    fn metadata_beats_hint() {
        let m = meta(None, Some("2021:02:03 04:05:06"));
        let (t, source) = resolve_capture_time(Some(&m), Some("2000:01:01 00:00:00"), fixed_now);
        assert_eq!(source, DateSource::Metadata);
        assert_eq!(date_dir(t.date()), "2021/02/03");
    }

    #[test]
    fn hint_used_when_metadata_missing() {
        let (t, source) = resolve_capture_time(None, Some("2019:12:31 23:59:59"), fixed_now);
        assert_eq!(source, DateSource::Hint);
        assert_eq!(date_dir(t.date()), "2019/12/31");
    }

    #[test]
    fn hint_used_when_metadata_unparseable() {
        let m = meta(Some("not a date"), None);
        let (_, source) = resolve_capture_time(Some(&m), Some("2019:12:31 23:59:59"), fixed_now);
        assert_eq!(source, DateSource::Hint);
    }

    #[test]
    fn clock_when_nothing_usable() {
        let (t, source) = resolve_capture_time(None, Some("2019-12-31"), fixed_now);
        assert_eq!(source, DateSource::Clock);
        assert_eq!(t, fixed_now());

        let (_, source) = resolve_capture_time(Some(&CaptureTimes::default()), None, fixed_now);
        assert_eq!(source, DateSource::Clock);
    }

    #[test]
    fn clock_is_not_consulted_when_metadata_wins() {
        let m = meta(Some("2023:05:01 10:00:00"), None);
        let (_, source) = resolve_capture_time(Some(&m), None, || {
            panic!("clock must not be read")
        });
        assert_eq!(source, DateSource::Metadata);
    }

    #[test]
    fn date_dir_zero_pads() {
        let d = NaiveDate::from_ymd_opt(987, 1, 2).unwrap();
        assert_eq!(date_dir(d), "0987/01/02");
    }

    #[test]
    fn partition_path_keeps_nested_names() {
        assert_eq!(
            partition_path(at("2023:05:01 10:00:00"), "trip/photo.jpg"),
            "2023/05/01/trip/photo.jpg"
        );
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("photo.jpg"));
        assert!(is_valid_name("trip/photo.jpg"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("/"));
        assert!(!is_valid_name("./"));
        assert!(!is_valid_name("../photo.jpg"));
        assert!(!is_valid_name("a/../../photo.jpg"));
    }
}
