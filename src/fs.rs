use crate::errors::CoreError;
use std::ffi::CString;
use std::fs::{self, DirBuilder, File, Metadata, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem abstraction boundary for the trash protocol.
///
/// Keeping this trait narrow makes it easy to inject failures in tests
/// (a rename that never succeeds, a full disk) without touching the protocol.
pub trait FileSystem: Send + Sync {
    /// Returns the current time in wall-clock format.
    fn now(&self) -> SystemTime;

    /// Reads file metadata, following symlinks.
    fn metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Reads symlink metadata.
    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata>;

    /// Resolves every symlink in `path` and returns the absolute real path.
    fn canonicalize(&self, path: &Path) -> crate::Result<PathBuf>;

    /// Creates a private (0700) directory and all missing parents.
    fn create_private_dir_all(&self, path: &Path) -> crate::Result<()>;

    /// Creates `path` for writing, failing if anything already exists there.
    fn create_new(&self, path: &Path) -> crate::Result<File>;

    /// Opens `path` for appending, creating it when missing.
    fn open_append(&self, path: &Path) -> crate::Result<File>;

    /// Removes a file.
    fn remove_file(&self, path: &Path) -> crate::Result<()>;

    /// Moves `from` to `to` atomically, failing with `AlreadyExists` when
    /// anything is present at `to`. Never falls back to copy + delete.
    fn rename_noreplace(&self, from: &Path, to: &Path) -> crate::Result<()>;
}

/// Default filesystem implementation backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn symlink_metadata(&self, path: &Path) -> crate::Result<Metadata> {
        fs::symlink_metadata(path).map_err(|err| CoreError::io(path, err))
    }

    fn canonicalize(&self, path: &Path) -> crate::Result<PathBuf> {
        fs::canonicalize(path).map_err(|err| CoreError::io(path, err))
    }

    fn create_private_dir_all(&self, path: &Path) -> crate::Result<()> {
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(path)
            .map_err(|err| CoreError::io(path, err))
    }

    fn create_new(&self, path: &Path) -> crate::Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|err| CoreError::io(path, err))
    }

    fn open_append(&self, path: &Path) -> crate::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| CoreError::io(path, err))
    }

    fn remove_file(&self, path: &Path) -> crate::Result<()> {
        fs::remove_file(path).map_err(|err| CoreError::io(path, err))
    }

    fn rename_noreplace(&self, from: &Path, to: &Path) -> crate::Result<()> {
        let c_from = c_path(from)?;
        let c_to = c_path(to)?;
        let rc = unsafe {
            libc::renameat2(
                libc::AT_FDCWD,
                c_from.as_ptr(),
                libc::AT_FDCWD,
                c_to.as_ptr(),
                libc::RENAME_NOREPLACE,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            // Filesystem or kernel without RENAME_NOREPLACE.
            Some(libc::EINVAL) | Some(libc::ENOSYS) => {
                tracing::debug!("renameat2 unavailable for {}: {err}", to.display());
                if fs::symlink_metadata(to).is_ok() {
                    let err = io::Error::from(io::ErrorKind::AlreadyExists);
                    return Err(CoreError::io(to, err));
                }
                fs::rename(from, to).map_err(|err| CoreError::io(from, err))
            }
            Some(libc::EEXIST) => Err(CoreError::io(to, err)),
            _ => Err(CoreError::io(from, err)),
        }
    }
}

fn c_path(path: &Path) -> crate::Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte");
        CoreError::io(path, err)
    })
}
