//! # Photoshelf
//!
//! A small image manager over a pluggable object store. Originals are filed by
//! the day they were taken, thumbnails are derived on demand, and slow writes
//! run on a pool of background workers.
//!
//! # Storage Layout
//!
//! ```text
//! 2023/05/01/photo.jpg               original, partitioned by capture date
//! .thumbnail/2023/05/01/photo.jpg    JPEG thumbnail, same key under .thumbnail/
//! ```
//!
//! The capture date comes from EXIF metadata when present, then a
//! caller-supplied hint, then the local clock. Every upload therefore lands
//! under some day directory.
//!
//! # Write Path
//!
//! ```text
//! upload_img ──▶ read body ──▶ resolve date ──▶ YYYY/MM/DD/<name> ──▶ ActionQueue
//!                                                                        │
//!                                      worker 0..N ◀────────────────────┘
//!                                          │
//!                                          ▼
//!                                     StorageDrive
//! ```
//!
//! Queued work is fire-and-forget. A failed action is logged and dropped; the
//! caller is never told. There is no per-key ordering, so two queued writes to
//! the same key race and the last one to finish wins.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manager`] | [`ImageManager`] facade: upload, fetch, thumbnail, delete, date-range walk |
//! | [`queue`] | FIFO of [`queue::Action`]s shared by the workers |
//! | [`worker`] | Worker threads and the action dispatcher |
//! | [`storage`] | [`storage::StorageDrive`] trait, local/memory/placeholder drives |
//! | [`imaging`] | Thumbnail generation: format allow-list, fit math, codec backend |
//! | [`metadata`] | Capture-time candidates from EXIF and their priority order |
//! | [`partition`] | Date resolution and `YYYY/MM/DD/<name>` keys |
//! | [`config`] | `photoshelf.toml` loading, defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Logging
//!
//! The library logs through `tracing` under `photoshelf::*` targets and never
//! installs a subscriber. The `photoshelf` binary does, honouring `RUST_LOG`.

pub mod config;
pub mod imaging;
pub mod manager;
pub mod metadata;
pub mod output;
pub mod partition;
pub mod queue;
pub mod storage;
pub mod worker;

pub use config::ManagerConfig;
pub use manager::{Image, ImageManager, ManagerError, RangeLimit};
