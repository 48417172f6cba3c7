//! Filesystem drive: each key is a file under a root directory.

use super::{Entry, ObjectReader, StorageDrive, StorageError, key_segments};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Stores objects as regular files below `root`, mirroring the key layout.
///
/// Uploads go to a temporary sibling file which is then renamed over the
/// target, so a concurrent download sees either the old or the new object,
/// never a half-written one.
#[derive(Debug, Clone)]
pub struct LocalDrive {
    root: PathBuf,
}

impl LocalDrive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut full = self.root.clone();
        full.extend(key_segments(path)?);
        Ok(full)
    }
}

fn write_part(tmp: &Path, content: &mut dyn Read, size: u64) -> io::Result<u64> {
    let mut file = fs::File::create(tmp)?;
    let n = io::copy(&mut content.take(size), &mut file)?;
    file.flush()?;
    Ok(n)
}

fn not_found_or_io(path: &str, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io(err)
    }
}

impl StorageDrive for LocalDrive {
    fn upload(&self, path: &str, content: &mut dyn Read, size: u64) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = target.with_file_name(format!(
            ".{file_name}.{:?}.part",
            std::thread::current().id()
        ));

        match write_part(&tmp, content, size) {
            Ok(n) if n == size => {}
            Ok(n) => {
                let _ = fs::remove_file(&tmp);
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {size} bytes for {path}, got {n}"),
                )));
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(StorageError::Io(e));
            }
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn download(&self, path: &str) -> Result<(ObjectReader, u64), StorageError> {
        let full = self.resolve(path)?;
        let file = fs::File::open(&full).map_err(|e| not_found_or_io(path, e))?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok((Box::new(io::BufReader::new(file)), meta.len()))
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| not_found_or_io(path, e))
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        match fs::metadata(&full) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn enumerate(
        &self,
        dir: &str,
        visit: &mut dyn FnMut(&Entry) -> bool,
    ) -> Result<(), StorageError> {
        let full = self.resolve(dir)?;
        if !full.is_dir() {
            return Ok(());
        }

        let walker = WalkDir::new(&full)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for item in walker {
            let item = item.map_err(|e| StorageError::Io(io::Error::other(e)))?;
            if !item.file_type().is_file() {
                continue;
            }
            let name = item.file_name().to_string_lossy().into_owned();
            // In-flight uploads
            if name.starts_with('.') && name.ends_with(".part") {
                continue;
            }
            let size = item
                .metadata()
                .map_err(|e| StorageError::Io(io::Error::other(e)))?
                .len();
            if !visit(&Entry { name, size }) {
                break;
            }
        }
        Ok(())
    }
}
