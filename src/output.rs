//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Upload
//!
//! ```text
//! 001 IMG_0042.jpg → 2023/05/01/IMG_0042.jpg
//! 002 notes.txt
//!     Error: invalid image name: ""
//!
//! Queued 1 upload, 1 failed
//! ```
//!
//! ## List
//!
//! ```text
//! 2023/05/01
//!     001 a.jpg (1.2 KB)
//!     002 b.jpg (880 B)
//! 2023/05/03
//!     001 c.jpg (3.4 MB)
//!
//! 3 images, 3 days
//! ```
//!
//! `list --json` prints the same entries as a JSON array of `{path, size}`.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count with one decimal above 1 KB.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Result of submitting one local file.
#[derive(Debug)]
pub struct UploadOutcome {
    /// File name as given on the command line.
    pub file: String,
    /// Derived storage key, or the error message.
    pub result: Result<String, String>,
}

pub fn format_upload_results(outcomes: &[UploadOutcome]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut failed = 0;

    for (i, outcome) in outcomes.iter().enumerate() {
        match &outcome.result {
            Ok(path) => {
                lines.push(format!("{} {} → {}", format_index(i + 1), outcome.file, path));
            }
            Err(message) => {
                failed += 1;
                lines.push(format!("{} {}", format_index(i + 1), outcome.file));
                lines.push(format!("    Error: {}", message));
            }
        }
    }

    lines.push(String::new());
    let queued = outcomes.len() - failed;
    if failed == 0 {
        lines.push(format!("Queued {}", plural(queued, "upload")));
    } else {
        lines.push(format!("Queued {}, {} failed", plural(queued, "upload"), failed));
    }
    lines
}

pub fn print_upload_results(outcomes: &[UploadOutcome]) {
    for line in format_upload_results(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// Fetch (get / thumbnail)
// ============================================================================

/// One line describing an object written to a local file.
///
/// ```text
/// .thumbnail/2023/05/01/a.jpg (12.0 KB) → a-thumb.jpg
/// ```
pub fn format_fetched(path: &str, size: u64, dest: &Path) -> String {
    format!("{} ({}) → {}", path, format_size(size), dest.display())
}

// ============================================================================
// Delete
// ============================================================================

pub fn format_delete_summary(requested: usize, queued: usize) -> String {
    let skipped = requested - queued;
    if skipped == 0 {
        format!("Queued {}", plural(queued, "delete"))
    } else {
        format!("Queued {}, skipped {} empty", plural(queued, "delete"), skipped)
    }
}

// ============================================================================
// List
// ============================================================================

/// One object reported by a date-range listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedObject {
    pub path: String,
    pub size: u64,
}

/// Split `YYYY/MM/DD/name` into its day directory and the rest.
fn split_day(path: &str) -> (&str, &str) {
    let mut cut = 0;
    for (count, (idx, _)) in path.match_indices('/').enumerate() {
        if count == 2 {
            cut = idx;
            break;
        }
    }
    if cut == 0 {
        ("", path)
    } else {
        (&path[..cut], &path[cut + 1..])
    }
}

/// Format a listing grouped by day, with a summary line.
///
/// Entries are expected in walk order, so all objects of one day are adjacent.
pub fn format_listing(objects: &[ListedObject]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_day: Option<&str> = None;
    let mut days = 0;
    let mut position = 0;

    for object in objects {
        let (day, name) = split_day(&object.path);
        if current_day != Some(day) {
            lines.push(day.to_string());
            current_day = Some(day);
            days += 1;
            position = 0;
        }
        position += 1;
        lines.push(format!(
            "    {} {} ({})",
            format_index(position),
            name,
            format_size(object.size)
        ));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("{}, {}", plural(objects.len(), "image"), plural(days, "day")));
    lines
}

pub fn format_listing_json(objects: &[ListedObject]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(objects)
}

pub fn print_listing(objects: &[ListedObject]) {
    for line in format_listing(objects) {
        println!("{}", line);
    }
}
