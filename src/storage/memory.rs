//! In-memory drive with an operation log.

use super::{Entry, ObjectReader, StorageDrive, StorageError, key_segments};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Mutex, MutexGuard};

/// One call made against a [`MemoryDrive`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOp {
    Upload { path: String, size: u64 },
    Download(String),
    Delete(String),
    Exists(String),
    Enumerate(String),
}

/// Objects held in a `BTreeMap` keyed by normalized path.
///
/// Every call is appended to an operation log, which is what tests assert on
/// ("exactly one thumbnail upload", "one delete for `a/b.jpg`"). Enumeration
/// visits objects in key order.
#[derive(Debug, Default)]
pub struct MemoryDrive {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    log: Mutex<Vec<DriveOp>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording an operation.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        if let Ok(segments) = key_segments(path) {
            lock(&self.objects).insert(segments.join("/"), bytes.into());
        }
    }

    /// Copy of the stored bytes, without recording an operation.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        let key = key_segments(path).ok()?.join("/");
        lock(&self.objects).get(&key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn operations(&self) -> Vec<DriveOp> {
        lock(&self.log).clone()
    }

    /// Number of uploads recorded for `path`.
    pub fn uploads_to(&self, path: &str) -> usize {
        lock(&self.log)
            .iter()
            .filter(|op| matches!(op, DriveOp::Upload { path: p, .. } if p == path))
            .count()
    }

    fn record(&self, op: DriveOp) {
        lock(&self.log).push(op);
    }
}

impl StorageDrive for MemoryDrive {
    fn upload(&self, path: &str, content: &mut dyn Read, size: u64) -> Result<(), StorageError> {
        self.record(DriveOp::Upload {
            path: path.to_string(),
            size,
        });
        let key = key_segments(path)?.join("/");
        let mut bytes = Vec::new();
        content.take(size).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {size} bytes for {path}, got {}", bytes.len()),
            )));
        }
        lock(&self.objects).insert(key, bytes);
        Ok(())
    }

    fn download(&self, path: &str) -> Result<(ObjectReader, u64), StorageError> {
        self.record(DriveOp::Download(path.to_string()));
        let key = key_segments(path)?.join("/");
        let bytes = lock(&self.objects)
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let size = bytes.len() as u64;
        Ok((Box::new(Cursor::new(bytes)), size))
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.record(DriveOp::Delete(path.to_string()));
        let key = key_segments(path)?.join("/");
        lock(&self.objects)
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(DriveOp::Exists(path.to_string()));
        let key = key_segments(path)?.join("/");
        Ok(lock(&self.objects).contains_key(&key))
    }

    fn enumerate(
        &self,
        dir: &str,
        visit: &mut dyn FnMut(&Entry) -> bool,
    ) -> Result<(), StorageError> {
        self.record(DriveOp::Enumerate(dir.to_string()));
        let prefix = format!("{}/", key_segments(dir)?.join("/"));

        // Snapshot so `visit` can call back into the drive without deadlocking.
        let entries: Vec<Entry> = lock(&self.objects)
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, bytes)| {
                let name = &key[prefix.len()..];
                (!name.contains('/')).then(|| Entry {
                    name: name.to_string(),
                    size: bytes.len() as u64,
                })
            })
            .collect();

        for entry in &entries {
            if !visit(entry) {
                break;
            }
        }
        Ok(())
    }
}
