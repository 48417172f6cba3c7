//! Storage drive contract and the bundled drives.
//!
//! A [`StorageDrive`] is a flat, byte-level object store addressed by
//! `/`-separated keys such as `2023/05/01/photo.jpg`. "Directories" are just
//! key prefixes; [`StorageDrive::enumerate`] lists the objects directly under one.
//!
//! | Drive | Use |
//! |---|---|
//! | [`LocalDrive`] | Objects as files under a root directory |
//! | [`MemoryDrive`] | In-process map with an operation log (tests, embedding) |
//! | [`UnimplementedDrive`] | Placeholder before a real drive is injected; every call fails |
//!
//! Drives must tolerate concurrent calls for the same key. There is no locking
//! above this layer, so an upload racing another upload to the same key simply
//! leaves one of the two payloads in place.

mod local;
mod memory;

pub use local::LocalDrive;
pub use memory::{DriveOp, MemoryDrive};

use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid storage path: {0:?}")]
    InvalidPath(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage drive does not implement {0}")]
    Unimplemented(&'static str),
}

/// A readable object body handed back by [`StorageDrive::download`].
///
/// Dropping the reader releases whatever the drive holds open for it.
pub type ObjectReader = Box<dyn Read + Send>;

/// One object visited by [`StorageDrive::enumerate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Final path segment (the file name), not the full key.
    pub name: String,
    pub size: u64,
}

/// Byte-level object store the image manager reads and writes through.
pub trait StorageDrive: Send + Sync {
    /// Store `size` bytes read from `content` at `path`, replacing any existing object.
    fn upload(&self, path: &str, content: &mut dyn Read, size: u64) -> Result<(), StorageError>;

    /// Open the object at `path`, returning its body and length.
    fn download(&self, path: &str) -> Result<(ObjectReader, u64), StorageError>;

    fn delete(&self, path: &str) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Visit the objects directly under `dir`, stopping early when `visit`
    /// returns `false`. Visit order is drive-defined. A directory with no
    /// objects (or that was never created) is not an error.
    fn enumerate(
        &self,
        dir: &str,
        visit: &mut dyn FnMut(&Entry) -> bool,
    ) -> Result<(), StorageError>;
}

/// Drive installed until the caller injects a real one; every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedDrive;

impl StorageDrive for UnimplementedDrive {
    fn upload(&self, _: &str, _: &mut dyn Read, _: u64) -> Result<(), StorageError> {
        Err(StorageError::Unimplemented("upload"))
    }

    fn download(&self, _: &str) -> Result<(ObjectReader, u64), StorageError> {
        Err(StorageError::Unimplemented("download"))
    }

    fn delete(&self, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Unimplemented("delete"))
    }

    fn exists(&self, _: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unimplemented("exists"))
    }

    fn enumerate(&self, _: &str, _: &mut dyn FnMut(&Entry) -> bool) -> Result<(), StorageError> {
        Err(StorageError::Unimplemented("enumerate"))
    }
}

/// Join key segments with `/`, dropping empty segments and stray slashes.
///
/// ```text
/// join_key(&[".thumbnail", "2023/05/01/a.jpg"]) → ".thumbnail/2023/05/01/a.jpg"
/// join_key(&["2023/05/01/", "/a.jpg"])         → "2023/05/01/a.jpg"
/// ```
pub fn join_key(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Validate a key and split it into its segments.
///
/// Rejects empty keys, absolute keys and any `..` segment, so a key can never
/// address something outside the drive's namespace.
pub(crate) fn key_segments(path: &str) -> Result<Vec<&str>, StorageError> {
    if path.starts_with('/') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() || segments.contains(&"..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}
