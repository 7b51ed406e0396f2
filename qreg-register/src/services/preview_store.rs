//! Local preview storage
//!
//! Previews are scratch files under a dedicated directory, one per live
//! capture. Acquisition and release are explicit: the workflow releases the
//! prior handle whenever a new preview is created, and releases the held
//! handle on every terminal transition (reset or successful registration).
//! `Drop` removes the file as a backstop so a leaked handle cannot outlive
//! its value.

use qreg_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Locally-addressable reference to a stored preview file
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
    released: bool,
}

impl PreviewHandle {
    /// Path of the preview file, for display by the embedding UI
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if !self.released {
            // Backstop only; the workflow releases handles explicitly
            if let Err(e) = std::fs::remove_file(&self.path) {
                debug!("Preview backstop removal failed for {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Scratch-directory store for capture previews
#[derive(Debug, Clone)]
pub struct PreviewStore {
    dir: PathBuf,
}

impl PreviewStore {
    /// Create a store rooted at `dir` (created on first acquisition)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store at the configured preview directory
    pub fn from_config() -> Self {
        Self::new(qreg_common::config::resolve_preview_dir(None))
    }

    /// Write `bytes` as a new preview file and return its handle
    ///
    /// Files are uuid-named with the original extension preserved, so
    /// simultaneous acquisitions never collide.
    pub fn acquire(&self, file_name: &str, bytes: &[u8]) -> Result<PreviewHandle> {
        std::fs::create_dir_all(&self.dir)?;

        let mut name = Uuid::new_v4().to_string();
        if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(ext);
        }
        let path = self.dir.join(name);

        std::fs::write(&path, bytes)?;
        debug!("Preview stored at {}", path.display());

        Ok(PreviewHandle {
            path,
            released: false,
        })
    }

    /// Remove the preview file and consume the handle
    pub fn release(&self, mut handle: PreviewHandle) -> Result<()> {
        handle.released = true;
        match std::fs::remove_file(&handle.path) {
            Ok(()) => {
                debug!("Preview released: {}", handle.path.display());
                Ok(())
            }
            Err(e) => Err(Error::Internal(format!(
                "failed to release preview {}: {}",
                handle.path.display(),
                e
            ))),
        }
    }

    /// Best-effort release used on cleanup paths where the workflow must
    /// not fail; errors are logged and swallowed
    pub fn release_quietly(&self, handle: PreviewHandle) {
        if let Err(e) = self.release(handle) {
            warn!("Preview release failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_writes_file_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(dir.path());

        let handle = store.acquire("photo.jpg", b"fake-jpeg-bytes").unwrap();
        assert!(handle.path().exists());
        assert_eq!(handle.path().extension().unwrap(), "jpg");
        assert_eq!(std::fs::read(handle.path()).unwrap(), b"fake-jpeg-bytes");

        store.release(handle).unwrap();
    }

    #[test]
    fn test_release_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(dir.path());

        let handle = store.acquire("photo.png", b"bytes").unwrap();
        let path = handle.path().to_path_buf();
        store.release(handle).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_backstop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(dir.path());

        let path = {
            let handle = store.acquire("photo.png", b"bytes").unwrap();
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_acquisitions_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreviewStore::new(dir.path());

        let a = store.acquire("x.jpg", b"a").unwrap();
        let b = store.acquire("x.jpg", b"b").unwrap();
        assert_ne!(a.path(), b.path());

        store.release(a).unwrap();
        store.release(b).unwrap();
    }
}
