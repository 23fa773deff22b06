//! Whole-file advisory locks (`flock(2)`), released on drop.

use crate::errors::CoreError;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Holds an exclusive advisory lock on an open file until dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks until an exclusive lock on `file` is granted.
    pub fn exclusive(file: File, path: &Path) -> crate::Result<Self> {
        loop {
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
            if rc == 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(CoreError::io(path, err));
            }
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc != 0 {
            tracing::warn!(
                "failed to release lock on {}: {}",
                self.path.display(),
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::TempDir;

    fn try_lock(path: &Path) -> bool {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger");
        std::fs::write(&path, "").unwrap();

        let file = OpenOptions::new().write(true).open(&path).unwrap();
        let lock = FileLock::exclusive(file, &path).unwrap();
        assert!(!try_lock(&path));

        drop(lock);
        assert!(try_lock(&path));
    }
}
