//! Storage backends for uploaded files.
//!
//! # Invariants
//! - Paths are relative, `/`-separated and never contain `..`.

use crate::file::{FileError, FileResult};
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Write/read access to stored files by relative path.
pub trait FileStorage {
    fn write(&self, relative_path: &str, bytes: &[u8]) -> FileResult<()>;
    fn read(&self, relative_path: &str) -> FileResult<Vec<u8>>;
}

impl<S: FileStorage + ?Sized> FileStorage for &S {
    fn write(&self, relative_path: &str, bytes: &[u8]) -> FileResult<()> {
        (**self).write(relative_path, bytes)
    }

    fn read(&self, relative_path: &str) -> FileResult<Vec<u8>> {
        (**self).read(relative_path)
    }
}

/// Filesystem storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative_path: &str) -> FileResult<PathBuf> {
        let relative = Path::new(relative_path);
        let is_clean = relative.file_name().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_clean {
            return Err(FileError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorage for LocalFileStorage {
    fn write(&self, relative_path: &str, bytes: &[u8]) -> FileResult<()> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| FileError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, bytes).map_err(|source| FileError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(
            "event=file_write module=file status=ok path={relative_path} bytes={}",
            bytes.len()
        );
        Ok(())
    }

    fn read(&self, relative_path: &str) -> FileResult<Vec<u8>> {
        let path = self.resolve(relative_path)?;
        fs::read(&path).map_err(|source| FileError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStorage, LocalFileStorage};
    use crate::file::FileError;

    #[test]
    fn write_creates_folders_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalFileStorage::new(dir.path());
        storage
            .write("person-picture/a.png", b"bytes")
            .expect("write");
        assert_eq!(storage.read("person-picture/a.png").expect("read"), b"bytes");
        assert!(dir.path().join("person-picture").is_dir());
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalFileStorage::new(dir.path());
        let err = storage.write("../escape.png", b"x").expect_err("traversal");
        assert!(matches!(err, FileError::InvalidPath(_)));
        assert!(matches!(
            storage.write("/abs.png", b"x"),
            Err(FileError::InvalidPath(_))
        ));
    }
}
