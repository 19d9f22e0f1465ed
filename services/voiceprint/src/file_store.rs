use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Errors from the voiceprint file store
#[derive(Error, Debug)]
pub enum FileStoreError {
    #[error("File already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Backing storage for voiceprint audio bytes
#[cfg_attr(test, mockall::automock)]
pub trait FileStore: Send + Sync {
    /// Create the device directory if needed and return it. Idempotent.
    fn ensure_directory(&self, device_id: &str) -> Result<PathBuf, FileStoreError>;

    /// Write `bytes` to a new file at `path` and return the size written.
    /// Never overwrites; a failed write leaves no file behind.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<u64, FileStoreError>;

    /// Best-effort removal. Returns whether a file was removed.
    fn delete(&self, path: &Path) -> bool;
}

/// File store on the local filesystem, laid out as `{root}/{device_id}/{file}`
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a device's files
    pub fn device_dir(&self, device_id: &str) -> PathBuf {
        self.root.join(sanitize_path_component(device_id))
    }
}

impl FileStore for LocalFileStore {
    fn ensure_directory(&self, device_id: &str) -> Result<PathBuf, FileStoreError> {
        let dir = self.device_dir(device_id);

        if dir.is_dir() {
            return Ok(dir);
        }

        // create_dir_all treats a concurrent creator as success
        fs::create_dir_all(&dir).map_err(|source| FileStoreError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;

        info!(path = %dir.display(), "Created voiceprint directory");
        Ok(dir)
    }

    #[instrument(skip(self, bytes), fields(path = %path.display(), size_bytes = bytes.len()))]
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<u64, FileStoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => FileStoreError::AlreadyExists {
                    path: path.to_path_buf(),
                },
                _ => FileStoreError::Write {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        let mut partial = PartialFile::new(file, path);

        partial
            .write_all(bytes)
            .map_err(|source| FileStoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        partial.commit().map_err(|source| FileStoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Voiceprint file written");
        Ok(bytes.len() as u64)
    }

    fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Voiceprint file deleted");
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Voiceprint file already absent");
                false
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to delete voiceprint file");
                metrics::counter!("voiceprint.files.delete_failed").increment(1);
                false
            }
        }
    }
}

/// A newly created file that is removed on drop unless committed
struct PartialFile {
    file: Option<File>,
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(file: File, path: &Path) -> Self {
        Self {
            file: Some(file),
            path: path.to_path_buf(),
            committed: false,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes),
            None => Err(io::Error::new(io::ErrorKind::Other, "file already closed")),
        }
    }

    /// Flush to disk and keep the file
    fn commit(mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_ref() {
            file.sync_all()?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Release the handle before unlinking
        self.file.take();

        if self.committed {
            return;
        }

        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove partial voiceprint file");
            }
        } else {
            debug!(path = %self.path.display(), "Removed partial voiceprint file");
        }
    }
}

/// Sanitize a path component to prevent path traversal
pub fn sanitize_path_component(component: &str) -> String {
    if component.is_empty() {
        return "_".to_string();
    }

    component
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("dev-1"), "dev-1");
        assert_eq!(sanitize_path_component("device/path"), "device_path");
        assert_eq!(sanitize_path_component(".."), "__");
        assert_eq!(sanitize_path_component(""), "_");
    }

    #[test]
    fn test_ensure_directory_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path());

        let first = store.ensure_directory("dev-1").unwrap();
        let second = store.ensure_directory("dev-1").unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        assert_eq!(store.root(), temp_dir.path());
        assert_eq!(first, store.root().join("dev-1"));
    }

    #[test]
    fn test_ensure_directory_concurrent() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path().join("nested"));

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| store.ensure_directory("dev-1").unwrap());
            }
        });

        assert!(store.device_dir("dev-1").is_dir());
    }

    #[test]
    fn test_write_returns_size() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        let dir = store.ensure_directory("dev-1").unwrap();
        let path = dir.join("a.wav");

        let size = store.write(&path, &[7u8; 5120]).unwrap();

        assert_eq!(size, 5120);
        assert_eq!(fs::read(&path).unwrap().len(), 5120);
    }

    #[test]
    fn test_write_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        let path = temp_dir.path().join("a.wav");
        fs::write(&path, b"original").unwrap();

        let result = store.write(&path, b"replacement");

        assert!(matches!(result, Err(FileStoreError::AlreadyExists { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn test_write_into_missing_directory_fails_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        let path = temp_dir.path().join("missing").join("a.wav");

        let result = store.write(&path, b"data");

        assert!(matches!(result, Err(FileStoreError::Write { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.wav");
        let file = File::create(&path).unwrap();

        {
            let mut partial = PartialFile::new(file, &path);
            partial.write_all(b"half").unwrap();
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp_dir.path());
        let path = temp_dir.path().join("a.wav");
        fs::write(&path, b"data").unwrap();

        assert!(store.delete(&path));
        assert!(!path.exists());
        assert!(!store.delete(&path));
    }
}
