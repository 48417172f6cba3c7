//! The image manager facade.
//!
//! [`ImageManager`] is the one type callers talk to. Write paths do their cheap
//! synchronous work on the caller's thread (reading the body, picking a date,
//! building the key) and hand persistence to the worker pool. Read paths and
//! [`ImageManager::delete_single_img`] run inline against the drive.
//!
//! ## Operations
//!
//! | Operation | Runs | Result |
//! |---|---|---|
//! | [`upload_img`](ImageManager::upload_img) | partition inline, upload queued | derived key |
//! | [`upload_img_async`](ImageManager::upload_img_async) | queued | none |
//! | [`generate_thumbnail`](ImageManager::generate_thumbnail) | inline | error |
//! | [`generate_thumbnail_async`](ImageManager::generate_thumbnail_async) | queued | none |
//! | [`get_img`](ImageManager::get_img) | inline | [`Image`] |
//! | [`get_thumbnail`](ImageManager::get_thumbnail) | inline, generates on miss | [`Image`] |
//! | [`delete_single_img`](ImageManager::delete_single_img) | inline | error |
//! | [`delete_single_img_async`](ImageManager::delete_single_img_async) | queued | none |
//! | [`delete_img`](ImageManager::delete_img) | queued | none |
//! | [`range_by_date`](ImageManager::range_by_date) | inline | error |
//! | [`collect_range`](ImageManager::collect_range) | inline | keys and sizes |
//!
//! Queued operations give no completion signal. Their failures are logged by
//! the worker and the action is dropped.

use crate::config::ManagerConfig;
use crate::imaging::{ImageBackend, RustBackend, ThumbnailError, thumbnail_path};
use crate::metadata::{ExifExtractor, MetadataExtractor};
use crate::partition::{date_dir, is_valid_name, partition_path, resolve_capture_time};
use crate::queue::{Action, ActionQueue};
use crate::storage::{ObjectReader, StorageDrive, StorageError, UnimplementedDrive, join_key};
use crate::worker::{Dispatcher, WorkerPool};
use chrono::{Days, NaiveDate};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use thiserror::Error;

const TRACING_TARGET: &str = "photoshelf::manager";

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("failed to encode thumbnail for {path}: {message}")]
    Encode { path: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid image name: {0:?}")]
    InvalidName(String),
}

impl From<ThumbnailError> for ManagerError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::UnsupportedFormat(path) => Self::UnsupportedFormat(path),
            ThumbnailError::Decode { path, message } => Self::Decode { path, message },
            ThumbnailError::Encode { path, message } => Self::Encode { path, message },
            ThumbnailError::Storage(e) => Self::Storage(e),
        }
    }
}

/// An object fetched from the drive.
///
/// The caller owns the stream; dropping the handle closes it.
pub struct Image {
    pub path: String,
    pub content: ObjectReader,
    /// Length reported by the drive.
    pub size: u64,
}

impl Image {
    /// Read the whole body into memory.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        self.content.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Image {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// How far [`ImageManager::range_by_date`] walks forward from its start day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLimit {
    /// Stop after this day (inclusive).
    Through(NaiveDate),
    /// Keep stepping one day at a time until the visitor returns `false`.
    Unbounded,
}

impl RangeLimit {
    /// Stop `days` days after `start`, or at the last representable day.
    pub fn days_after(start: NaiveDate, days: u64) -> Self {
        RangeLimit::Through(
            start
                .checked_add_days(Days::new(days))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    fn covers(self, day: NaiveDate) -> bool {
        match self {
            RangeLimit::Through(end) => day <= end,
            RangeLimit::Unbounded => true,
        }
    }
}

pub struct ImageManager {
    queue: Arc<ActionQueue>,
    dispatcher: Arc<Dispatcher>,
    extractor: Arc<dyn MetadataExtractor>,
    pool: WorkerPool,
}

impl ImageManager {
    /// Start a manager with the stock collaborators.
    ///
    /// The drive is an [`UnimplementedDrive`] until [`set_drive`](Self::set_drive)
    /// installs a real one.
    pub fn new(config: &ManagerConfig) -> Result<Self, ManagerError> {
        Self::with_parts(
            config,
            Arc::new(UnimplementedDrive),
            Arc::new(ExifExtractor::new()),
            Arc::new(RustBackend::new()),
        )
    }

    /// Start a manager with injected collaborators. Workers begin polling
    /// before this returns.
    pub fn with_parts(
        config: &ManagerConfig,
        drive: Arc<dyn StorageDrive>,
        extractor: Arc<dyn MetadataExtractor>,
        backend: Arc<dyn ImageBackend>,
    ) -> Result<Self, ManagerError> {
        let settings = config.effective();
        let queue = Arc::new(ActionQueue::new());
        let dispatcher = Arc::new(Dispatcher::new(drive, backend, settings.thumbnails));
        let pool = WorkerPool::start(
            settings.workers,
            settings.poll_interval,
            Arc::clone(&queue),
            Arc::clone(&dispatcher),
        )?;
        Ok(Self {
            queue,
            dispatcher,
            extractor,
            pool,
        })
    }

    pub fn drive(&self) -> Arc<dyn StorageDrive> {
        self.dispatcher.drive()
    }

    /// Replace the drive. Actions already queued run against whichever drive
    /// is installed when a worker picks them up.
    pub fn set_drive(&self, drive: Arc<dyn StorageDrive>) {
        self.dispatcher.set_drive(drive);
    }

    /// Actions queued and not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    fn enqueue(&self, action: Action) {
        if let Err(action) = self.queue.push(action) {
            tracing::warn!(
                target: TRACING_TARGET,
                action = action.kind(),
                path = %action.path(),
                "queue closed, dropping action"
            );
        }
    }

    /// File an image under the day it was taken and queue the upload.
    ///
    /// The date comes from embedded metadata, then `date_hint`
    /// (`YYYY:MM:DD HH:MM:SS`), then the local clock. An existing object at
    /// the derived key is overwritten. Returns the derived key.
    pub fn upload_img(
        &self,
        mut content: impl Read,
        name: &str,
        date_hint: Option<&str>,
    ) -> Result<String, ManagerError> {
        if !is_valid_name(name) {
            return Err(ManagerError::InvalidName(name.to_string()));
        }
        let mut data = Vec::new();
        content.read_to_end(&mut data)?;

        let metadata = match self.extractor.extract(&data) {
            Ok(times) => Some(times),
            Err(err) => {
                tracing::warn!(target: TRACING_TARGET, name, error = %err, "no usable metadata");
                None
            }
        };
        let (time, source) = resolve_capture_time(metadata.as_ref(), date_hint, || {
            chrono::Local::now().naive_local()
        });
        let path = partition_path(time, name);
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            source = %source,
            "partitioned upload"
        );

        self.upload_img_async(&path, data);
        Ok(path)
    }

    /// Queue `content` for upload at exactly `path`.
    pub fn upload_img_async(&self, path: &str, content: Vec<u8>) {
        self.enqueue(Action::Upload {
            path: path.to_string(),
            content,
        });
    }

    /// Generate and store the thumbnail for `path` on the calling thread.
    pub fn generate_thumbnail(&self, path: &str, content: &[u8]) -> Result<(), ManagerError> {
        self.dispatcher.generate_thumbnail(path, content)?;
        Ok(())
    }

    pub fn generate_thumbnail_async(&self, path: &str, content: Vec<u8>) {
        self.enqueue(Action::GenerateThumbnail {
            path: path.to_string(),
            content,
        });
    }

    /// Open the object at `path`. Drive errors come back unchanged.
    pub fn get_img(&self, path: &str) -> Result<Image, ManagerError> {
        let (content, size) = self.drive().download(path)?;
        Ok(Image {
            path: path.to_string(),
            content,
            size,
        })
    }

    /// Open the thumbnail for the original at `path`, generating it first if
    /// it does not exist yet.
    ///
    /// Generation happens on the calling thread, not in the pool. The returned
    /// image's `path` is the thumbnail key.
    pub fn get_thumbnail(&self, path: &str) -> Result<Image, ManagerError> {
        let drive = self.drive();
        let thumb_path = thumbnail_path(path);

        if !drive.exists(&thumb_path)? {
            let original = {
                let (mut reader, size) = drive.download(path)?;
                let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
                reader.read_to_end(&mut buf)?;
                buf
            };
            tracing::debug!(target: TRACING_TARGET, path, "generating missing thumbnail");
            self.dispatcher.generate_thumbnail(path, &original)?;
        }

        let (content, size) = drive.download(&thumb_path)?;
        Ok(Image {
            path: thumb_path,
            content,
            size,
        })
    }

    /// Delete `path` on the calling thread. An empty path does nothing.
    pub fn delete_single_img(&self, path: &str) -> Result<(), ManagerError> {
        if path.is_empty() {
            return Ok(());
        }
        self.drive().delete(path)?;
        Ok(())
    }

    /// Queue a delete for `path`. An empty path does nothing.
    pub fn delete_single_img_async(&self, path: &str) {
        if !path.is_empty() {
            self.enqueue(Action::Delete {
                path: path.to_string(),
            });
        }
    }

    /// Queue one delete per non-empty path.
    pub fn delete_img<S: AsRef<str>>(&self, paths: &[S]) {
        for path in paths {
            self.delete_single_img_async(path.as_ref());
        }
    }

    /// Walk day directories from `start`, calling `visit(key, size)` for each
    /// object.
    ///
    /// Returning `false` from `visit` stops immediately, mid-day included. Days
    /// with no directory contribute nothing. A drive error ends the walk and is
    /// returned.
    pub fn range_by_date(
        &self,
        start: NaiveDate,
        limit: RangeLimit,
        mut visit: impl FnMut(&str, u64) -> bool,
    ) -> Result<(), ManagerError> {
        let drive = self.drive();
        let mut day = start;

        while limit.covers(day) {
            let dir = date_dir(day);
            let mut keep_going = true;
            drive.enumerate(&dir, &mut |entry| {
                let path = join_key(&[dir.as_str(), entry.name.as_str()]);
                keep_going = visit(&path, entry.size);
                keep_going
            })?;
            if !keep_going {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        Ok(())
    }

    /// Collect keys and sizes from a date-range walk, stopping once `max`
    /// objects are in hand.
    ///
    /// With [`RangeLimit::Unbounded`] the walk only ends when `max` is reached,
    /// so pair it with a `max` or use [`RangeLimit::days_after`].
    pub fn collect_range(
        &self,
        start: NaiveDate,
        limit: RangeLimit,
        max: Option<usize>,
    ) -> Result<Vec<(String, u64)>, ManagerError> {
        let mut found = Vec::new();
        if max == Some(0) {
            return Ok(found);
        }
        self.range_by_date(start, limit, |path, size| {
            found.push((path.to_string(), size));
            max.is_none_or(|n| found.len() < n)
        })?;
        Ok(found)
    }

    /// Stop accepting work, finish everything already queued, and join the
    /// workers. Dropping the manager does the same.
    pub fn shutdown(mut self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{GatedBackend, MockBackend, RecordedOp};
    use crate::metadata::CaptureTimes;
    use crate::metadata::tests::StaticExtractor;
    use crate::storage::{DriveOp, MemoryDrive};
    use std::thread;
    use std::time::{Duration, Instant};

    struct Harness {
        manager: ImageManager,
        drive: Arc<MemoryDrive>,
        backend: Arc<MockBackend>,
    }

    fn harness(metadata: Option<CaptureTimes>) -> Harness {
        let drive = Arc::new(MemoryDrive::new());
        let backend = Arc::new(MockBackend::new());
        let mut config = ManagerConfig::default();
        config.workers.count = 2;
        config.workers.poll_interval_ms = 5;
        let manager = ImageManager::with_parts(
            &config,
            drive.clone(),
            Arc::new(StaticExtractor(metadata)),
            backend.clone(),
        )
        .unwrap();
        Harness {
            manager,
            drive,
            backend,
        }
    }

    fn primary(ts: &str) -> Option<CaptureTimes> {
        Some(CaptureTimes {
            primary: Some(ts.to_string()),
            ..CaptureTimes::default()
        })
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn non_positive_worker_count_uses_default() {
        let mut config = ManagerConfig::default();
        config.workers.count = 0;
        let manager = ImageManager::new(&config).unwrap();
        assert_eq!(manager.workers(), 5);
        manager.shutdown();
    }

    #[test]
    fn default_drive_is_unimplemented() {
        let manager = ImageManager::new(&ManagerConfig::default()).unwrap();
        let result = manager.get_img("a.jpg");
        assert!(matches!(
            result,
            Err(ManagerError::Storage(StorageError::Unimplemented("download")))
        ));
    }

    #[test]
    fn set_drive_replaces_drive() {
        let manager = ImageManager::new(&ManagerConfig::default()).unwrap();
        let drive = Arc::new(MemoryDrive::new());
        drive.insert("a.jpg", b"x".to_vec());
        manager.set_drive(drive.clone());

        assert_eq!(manager.get_img("a.jpg").unwrap().into_bytes().unwrap(), b"x");
        assert!(manager.drive().exists("a.jpg").unwrap());
    }

    // =========================================================================
    // Upload
    // =========================================================================

    #[test]
    fn upload_files_under_metadata_date() {
        let h = harness(primary("2023:05:01 10:00:00"));
        let path = h
            .manager
            .upload_img(&b"bytes"[..], "photo.jpg", Some("1999:01:01 00:00:00"))
            .unwrap();
        assert_eq!(path, "2023/05/01/photo.jpg");

        h.manager.shutdown();
        assert_eq!(h.drive.get("2023/05/01/photo.jpg").unwrap(), b"bytes");
    }

    #[test]
    fn upload_falls_back_to_hint() {
        let h = harness(None);
        let path = h
            .manager
            .upload_img(&b"x"[..], "scan.png", Some("2019:12:31 23:59:59"))
            .unwrap();
        assert_eq!(path, "2019/12/31/scan.png");
    }

    #[test]
    fn upload_without_any_date_still_gets_partitioned() {
        let h = harness(None);
        let path = h.manager.upload_img(&b"x"[..], "now.jpg", None).unwrap();

        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), 4);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 2);
        assert_eq!(parts[3], "now.jpg");
    }

    #[test]
    fn upload_rejects_bad_names() {
        let h = harness(None);
        assert!(matches!(
            h.manager.upload_img(&b"x"[..], "", None),
            Err(ManagerError::InvalidName(_))
        ));
        assert!(matches!(
            h.manager.upload_img(&b"x"[..], "../escape.jpg", None),
            Err(ManagerError::InvalidName(_))
        ));
        h.manager.shutdown();
        assert!(h.drive.operations().is_empty());
    }

    #[test]
    fn upload_surfaces_read_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }
        let h = harness(None);
        assert!(matches!(
            h.manager.upload_img(Broken, "a.jpg", None),
            Err(ManagerError::Io(_))
        ));
    }

    #[test]
    fn upload_overwrites_existing_object() {
        let h = harness(primary("2023:05:01 10:00:00"));
        h.drive.insert("2023/05/01/photo.jpg", b"old".to_vec());
        h.manager.upload_img(&b"new"[..], "photo.jpg", None).unwrap();
        h.manager.shutdown();
        assert_eq!(h.drive.get("2023/05/01/photo.jpg").unwrap(), b"new");
    }

    #[test]
    fn async_thumbnail_is_generated_by_worker() {
        let h = harness(None);
        h.manager.generate_thumbnail_async("a/b.jpg", b"img".to_vec());
        h.manager.shutdown();
        assert!(h.drive.get(".thumbnail/a/b.jpg").is_some());
    }

    #[test]
    fn pending_counts_actions_not_yet_taken() {
        let drive = Arc::new(MemoryDrive::new());
        let (backend, release) = GatedBackend::new();
        let mut config = ManagerConfig::default();
        config.workers.count = 1;
        config.workers.poll_interval_ms = 5;
        let manager = ImageManager::with_parts(
            &config,
            drive.clone(),
            Arc::new(StaticExtractor(None)),
            Arc::new(backend),
        )
        .unwrap();
        assert_eq!(manager.pending(), 0);

        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            manager.generate_thumbnail_async(name, b"img".to_vec());
        }
        // The only worker holds the first action at the gate.
        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.pending() != 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(manager.pending(), 2);

        for _ in 0..3 {
            release.send(()).unwrap();
        }
        manager.shutdown();
        assert_eq!(drive.keys().len(), 3);
    }

    #[test]
    fn queued_failure_is_dropped_silently() {
        let h = harness(None);
        h.manager.generate_thumbnail_async("a/b.gif", b"img".to_vec());
        h.manager.shutdown();
        assert!(h.drive.operations().is_empty());
        assert!(h.backend.get_operations().is_empty());
    }

    // =========================================================================
    // Thumbnails
    // =========================================================================

    #[test]
    fn get_thumbnail_generates_exactly_once() {
        let h = harness(None);
        h.drive.insert("2023/05/01/a.jpg", b"original".to_vec());

        let first = h.manager.get_thumbnail("2023/05/01/a.jpg").unwrap();
        assert_eq!(first.path, ".thumbnail/2023/05/01/a.jpg");
        let first = first.into_bytes().unwrap();

        let second = h
            .manager
            .get_thumbnail("2023/05/01/a.jpg")
            .unwrap()
            .into_bytes()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(h.drive.uploads_to(".thumbnail/2023/05/01/a.jpg"), 1);
        let generated = h
            .backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Thumbnail { .. }))
            .count();
        assert_eq!(generated, 1);
    }

    #[test]
    fn get_thumbnail_missing_original_is_storage_error() {
        let h = harness(None);
        assert!(matches!(
            h.manager.get_thumbnail("nope.jpg"),
            Err(ManagerError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn get_thumbnail_unsupported_format_uploads_nothing() {
        let h = harness(None);
        h.drive.insert("clip.gif", b"gif".to_vec());
        assert!(matches!(
            h.manager.get_thumbnail("clip.gif"),
            Err(ManagerError::UnsupportedFormat(_))
        ));
        assert_eq!(h.drive.uploads_to(".thumbnail/clip.gif"), 0);
    }

    #[test]
    fn generate_thumbnail_reports_decode_failure() {
        let drive = Arc::new(MemoryDrive::new());
        let manager = ImageManager::with_parts(
            &ManagerConfig::default(),
            drive.clone(),
            Arc::new(StaticExtractor(None)),
            Arc::new(MockBackend::failing()),
        )
        .unwrap();
        assert!(matches!(
            manager.generate_thumbnail("a.jpg", b"junk"),
            Err(ManagerError::Decode { .. })
        ));
        assert!(drive.operations().is_empty());
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    #[test]
    fn delete_img_skips_empty_entries() {
        let h = harness(None);
        h.drive.insert("a/b.jpg", b"x".to_vec());
        h.manager.delete_img(&["", "a/b.jpg", ""]);
        h.manager.shutdown();

        let deletes: Vec<DriveOp> = h
            .drive
            .operations()
            .into_iter()
            .filter(|op| matches!(op, DriveOp::Delete(_)))
            .collect();
        assert_eq!(deletes, vec![DriveOp::Delete("a/b.jpg".into())]);
    }

    #[test]
    fn delete_single_img_empty_path_is_noop() {
        let h = harness(None);
        h.manager.delete_single_img("").unwrap();
        h.manager.delete_single_img_async("");
        h.manager.shutdown();
        assert!(h.drive.operations().is_empty());
    }

    #[test]
    fn delete_single_img_surfaces_drive_error() {
        let h = harness(None);
        assert!(matches!(
            h.manager.delete_single_img("missing.jpg"),
            Err(ManagerError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn delete_single_img_removes_object() {
        let h = harness(None);
        h.drive.insert("a/b.jpg", b"x".to_vec());
        h.manager.delete_single_img("a/b.jpg").unwrap();
        assert!(h.drive.get("a/b.jpg").is_none());
    }

    // =========================================================================
    // Date ranges
    // =========================================================================

    fn seeded() -> Harness {
        let h = harness(None);
        h.drive.insert("2023/05/01/a.jpg", b"1".to_vec());
        h.drive.insert("2023/05/01/b.jpg", b"22".to_vec());
        h.drive.insert("2023/05/03/c.jpg", b"333".to_vec());
        h.drive.insert("2023/05/09/d.jpg", b"4444".to_vec());
        h
    }

    #[test]
    fn range_through_end_date_inclusive() {
        let h = seeded();
        let mut seen = Vec::new();
        h.manager
            .range_by_date(day(2023, 5, 1), RangeLimit::Through(day(2023, 5, 3)), |p, s| {
                seen.push((p.to_string(), s));
                true
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                ("2023/05/01/a.jpg".to_string(), 1),
                ("2023/05/01/b.jpg".to_string(), 2),
                ("2023/05/03/c.jpg".to_string(), 3),
            ]
        );
    }

    #[test]
    fn range_stops_mid_day() {
        let h = seeded();
        let mut seen = Vec::new();
        h.manager
            .range_by_date(day(2023, 5, 1), RangeLimit::Unbounded, |p, _| {
                seen.push(p.to_string());
                false
            })
            .unwrap();
        assert_eq!(seen, vec!["2023/05/01/a.jpg"]);
    }

    #[test]
    fn unbounded_range_runs_until_visitor_stops() {
        let h = seeded();
        let mut seen = Vec::new();
        h.manager
            .range_by_date(day(2023, 5, 2), RangeLimit::Unbounded, |p, _| {
                seen.push(p.to_string());
                !p.ends_with("d.jpg")
            })
            .unwrap();
        assert_eq!(seen, vec!["2023/05/03/c.jpg", "2023/05/09/d.jpg"]);
    }

    #[test]
    fn range_before_start_is_empty() {
        let h = seeded();
        let mut calls = 0;
        h.manager
            .range_by_date(day(2023, 5, 4), RangeLimit::Through(day(2023, 5, 1)), |_, _| {
                calls += 1;
                true
            })
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn collect_range_stops_when_last_wanted_object_is_seen() {
        let h = seeded();
        // Exactly two objects exist from May 3 on; the unbounded walk must end on the second.
        let found = h
            .manager
            .collect_range(day(2023, 5, 3), RangeLimit::Unbounded, Some(2))
            .unwrap();
        assert_eq!(
            found,
            vec![
                ("2023/05/03/c.jpg".to_string(), 3),
                ("2023/05/09/d.jpg".to_string(), 4),
            ]
        );
    }

    #[test]
    fn collect_range_with_fewer_objects_than_max_ends_at_window() {
        let h = seeded();
        let found = h
            .manager
            .collect_range(day(2023, 5, 1), RangeLimit::days_after(day(2023, 5, 1), 30), Some(10))
            .unwrap();
        assert_eq!(found.len(), 4);

        let walked = h
            .drive
            .operations()
            .into_iter()
            .filter(|op| matches!(op, DriveOp::Enumerate(_)))
            .count();
        assert_eq!(walked, 31);
    }

    #[test]
    fn collect_range_zero_max_walks_nothing() {
        let h = seeded();
        let found = h
            .manager
            .collect_range(day(2023, 5, 1), RangeLimit::Unbounded, Some(0))
            .unwrap();
        assert!(found.is_empty());
        assert!(h.drive.operations().is_empty());
    }

    #[test]
    fn days_after_saturates_at_calendar_end() {
        assert_eq!(
            RangeLimit::days_after(day(2023, 5, 1), 2),
            RangeLimit::Through(day(2023, 5, 3))
        );
        assert_eq!(
            RangeLimit::days_after(NaiveDate::MAX, 5),
            RangeLimit::Through(NaiveDate::MAX)
        );
    }

    #[test]
    fn range_surfaces_drive_errors() {
        let manager = ImageManager::new(&ManagerConfig::default()).unwrap();
        let result = manager.range_by_date(
            day(2023, 5, 1),
            RangeLimit::Through(day(2023, 5, 1)),
            |_, _| true,
        );
        assert!(matches!(
            result,
            Err(ManagerError::Storage(StorageError::Unimplemented("enumerate")))
        ));
    }
}
