//! Home trash following the freedesktop.org Trash specification.
//!
//! <https://specifications.freedesktop.org/trash-spec/latest/>

use crate::errors::CoreError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::helpers::{
    build_unique_basename, directory_size, epoch_millis, is_searchable, is_writable,
    local_deletion_date,
};
use crate::lock::FileLock;
use crate::models::{CollisionAction, DirectorySizeEntry, TrashDirectory, TrashInfoRecord};
use crate::platform::PlatformFolders;
use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A reserved trash name: the exclusively created, locked `.trashinfo`
/// sidecar plus the matching `files/` destination.
///
/// Dropping an unsuccessful slot releases the lock and deletes the sidecar, so
/// a failed move never leaves an orphaned record behind.
struct TrashSlot<'a, F: FileSystem> {
    fs: &'a F,
    lock: Option<FileLock>,
    attempt: u64,
    trashed_name: OsString,
    info_path: PathBuf,
    data_path: PathBuf,
    success: bool,
}

impl<F: FileSystem> TrashSlot<'_, F> {
    fn write_info(&self, record: &TrashInfoRecord) -> crate::Result<()> {
        let lock = self
            .lock
            .as_ref()
            .ok_or_else(|| CoreError::invalid_input("trash slot is not locked"))?;
        let mut file = lock.file();
        file.write_all(record.render().as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| CoreError::io(&self.info_path, err))
    }
}

impl<F: FileSystem> Drop for TrashSlot<'_, F> {
    fn drop(&mut self) {
        drop(self.lock.take());
        if self.success {
            return;
        }
        match self.fs.remove_file(&self.info_path) {
            Ok(()) => debug!("released trash name {}", self.info_path.display()),
            Err(err) if err.io_kind() == Some(io::ErrorKind::NotFound) => {}
            Err(err) => warn!("failed to remove trash info {}: {err}", self.info_path.display()),
        }
    }
}

/// Moves files and directories into the user's home trash.
pub struct TrashService<F: FileSystem = RealFileSystem> {
    folders: Arc<dyn PlatformFolders>,
    fs: F,
}

impl TrashService<RealFileSystem> {
    pub fn new(folders: Arc<dyn PlatformFolders>) -> Self {
        Self::with_file_system(folders, RealFileSystem)
    }
}

impl<F: FileSystem> TrashService<F> {
    pub fn with_file_system(folders: Arc<dyn PlatformFolders>, fs: F) -> Self {
        Self { folders, fs }
    }

    /// The trash directory currently configured, re-resolved on every call.
    pub fn trash_directory(&self) -> TrashDirectory {
        TrashDirectory::new(self.folders.trash_folder())
    }

    /// Moves `path` into the trash.
    ///
    /// Returns `Ok(false)` without touching anything when `path` does not
    /// exist, is a symbolic link, is not writable, or its parent directory is
    /// not searchable. The move never replaces an existing `files/` entry:
    /// if one appears under the reserved name, the next suffix is tried. I/O
    /// failures during the move itself are returned as errors after the
    /// reserved `.trashinfo` sidecar has been removed.
    pub fn move_to_trash(&self, path: &Path) -> crate::Result<bool> {
        let path = absolute(path)?;
        let attr = match self.fs.symlink_metadata(&path) {
            Ok(attr) => attr,
            Err(err) => {
                debug!("not trashing {}: {err}", path.display());
                return Ok(false);
            }
        };
        if attr.file_type().is_symlink() {
            debug!("not trashing symbolic link {}", path.display());
            return Ok(false);
        }
        if !is_writable(&path) {
            debug!("not trashing {}: not writable", path.display());
            return Ok(false);
        }
        let parent = path.parent().unwrap_or(Path::new("/"));
        if !is_searchable(parent) {
            debug!("not trashing {}: parent not searchable", path.display());
            return Ok(false);
        }

        let source = self.fs.canonicalize(&path)?;
        let Some(name) = source.file_name() else {
            debug!("not trashing {}: no file name", source.display());
            return Ok(false);
        };

        let trash = self.trash_directory();
        self.fs.create_private_dir_all(&trash.info_dir)?;
        self.fs.create_private_dir_all(&trash.files_dir)?;

        let dir_size = if attr.is_dir() {
            Some(directory_size(&source)?)
        } else {
            None
        };

        let mut first_attempt = 0;
        loop {
            let mut slot = self.reserve(&trash, name, first_attempt)?;
            slot.write_info(&TrashInfoRecord {
                original_path: source.clone(),
                deletion_date: local_deletion_date(self.fs.now()),
                trashed_name: slot.trashed_name.clone(),
            })?;
            if let Some(size) = dir_size {
                self.record_directory_size(&trash, &slot, size)?;
            }

            match self.fs.rename_noreplace(&source, &slot.data_path) {
                Ok(()) => {}
                Err(err) if err.io_kind() == Some(io::ErrorKind::AlreadyExists) => {
                    debug!("{} appeared during the move, retrying", slot.data_path.display());
                    first_attempt = slot.attempt + 1;
                    continue;
                }
                Err(err) => return Err(err),
            }
            slot.success = self.fs.symlink_metadata(&slot.data_path).is_ok();
            if slot.success {
                debug!("trashed {} as {}", source.display(), slot.data_path.display());
            }
            return Ok(slot.success);
        }
    }

    /// Finds the first free `<name>[_<n>]` by exclusively creating its sidecar.
    ///
    /// Names whose sidecar already exists, or whose `files/` entry is occupied
    /// by an orphan, are skipped. Every attempt creates a file, so the suffix
    /// strictly increases and the loop cannot spin without doing I/O.
    fn reserve<'a>(
        &'a self,
        trash: &TrashDirectory,
        name: &OsStr,
        first_attempt: u64,
    ) -> crate::Result<TrashSlot<'a, F>> {
        for attempt in first_attempt.. {
            let candidate = build_unique_basename(name, attempt);
            let info_path = trash.info_file(&candidate);
            let file = match self.fs.create_new(&info_path) {
                Ok(file) => file,
                Err(err) if err.io_kind() == Some(io::ErrorKind::AlreadyExists) => continue,
                Err(err) => return Err(err),
            };
            let mut slot = TrashSlot {
                fs: &self.fs,
                lock: None,
                attempt,
                data_path: trash.data_file(&candidate),
                trashed_name: candidate,
                info_path,
                success: false,
            };
            slot.lock = Some(FileLock::exclusive(file, &slot.info_path)?);
            if self.fs.symlink_metadata(&slot.data_path).is_ok() {
                debug!("skipping {}: data entry without info", slot.data_path.display());
                continue;
            }
            debug!("reserved trash name {}", slot.info_path.display());
            return Ok(slot);
        }
        Err(CoreError::invalid_path(format!(
            "no free trash name for {}",
            Path::new(name).display()
        )))
    }

    /// Appends one line for a trashed directory to the shared size ledger.
    fn record_directory_size(
        &self,
        trash: &TrashDirectory,
        slot: &TrashSlot<'_, F>,
        size: u64,
    ) -> crate::Result<()> {
        let info_mtime = self
            .fs
            .metadata(&slot.info_path)?
            .modified()
            .map_err(|err| CoreError::io(&slot.info_path, err))?;
        let entry = DirectorySizeEntry::new(size, epoch_millis(info_mtime), Path::new(&slot.trashed_name));

        let ledger = trash.directory_sizes();
        let file = self.fs.open_append(&ledger)?;
        let lock = FileLock::exclusive(file, &ledger)?;
        let mut file = lock.file();
        file.write_all(entry.to_line().as_bytes())
            .map_err(|err| CoreError::io(&ledger, err))
    }

    /// Restores a trashed item, consulting `resolver` when the original
    /// location is occupied.
    ///
    /// Not supported yet: always returns [`CoreError::Unsupported`].
    pub fn restore_from_trash<R>(&self, path: &Path, _resolver: R) -> crate::Result<bool>
    where
        R: Fn(&Path, &Path) -> CollisionAction,
    {
        Err(CoreError::unsupported(format!(
            "restoring {} from trash",
            path.display()
        )))
    }

    /// [`TrashService::restore_from_trash`] with a resolver that always cancels.
    pub fn restore_from_trash_default(&self, path: &Path) -> crate::Result<bool> {
        self.restore_from_trash(path, |_existing, _to_restore| CollisionAction::Cancel)
    }
}

fn absolute(path: &Path) -> crate::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|err| CoreError::io(path, err))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::XdgFolders;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn service(tmp: &TempDir) -> TrashService {
        let vars = HashMap::from([
            ("HOME".to_string(), tmp.path().to_string_lossy().into_owned()),
            (
                "XDG_DATA_HOME".to_string(),
                tmp.path().join("data").to_string_lossy().into_owned(),
            ),
        ]);
        TrashService::new(Arc::new(XdgFolders::from_environ(vars)))
    }

    #[test]
    fn trashes_file_and_writes_sidecar() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("my notes.txt");
        fs::write(&file, "bye").unwrap();
        let service = service(&tmp);

        assert!(service.move_to_trash(&file).unwrap());

        let trash = service.trash_directory();
        let name = OsStr::new("my notes.txt");
        assert!(!file.exists());
        assert_eq!(fs::read_to_string(trash.data_file(name)).unwrap(), "bye");
        let info = fs::read_to_string(trash.info_file(name)).unwrap();
        let record = TrashInfoRecord::parse(name, &info).unwrap();
        let expected = fs::canonicalize(tmp.path()).unwrap().join("my notes.txt");
        assert_eq!(record.original_path, expected);
        assert!(info.contains("my%20notes.txt"));
        assert!(!trash.directory_sizes().exists());
    }

    #[test]
    fn missing_path_is_not_trashed() {
        let tmp = TempDir::new().unwrap();
        assert!(!service(&tmp).move_to_trash(&tmp.path().join("nope")).unwrap());
    }

    #[test]
    fn name_collisions_get_suffixes() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        for dir in ["a", "b", "c"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
            let file = tmp.path().join(dir).join("same.txt");
            fs::write(&file, dir).unwrap();
            assert!(service.move_to_trash(&file).unwrap());
        }

        let trash = service.trash_directory();
        for (suffix, content) in [("", "a"), ("_1", "b"), ("_2", "c")] {
            let name = OsString::from(format!("same.txt{suffix}"));
            assert_eq!(fs::read_to_string(trash.data_file(&name)).unwrap(), content);
            assert!(trash.info_file(&name).exists());
        }
    }

    #[test]
    fn orphaned_data_entry_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        let trash = service.trash_directory();
        fs::create_dir_all(&trash.files_dir).unwrap();
        fs::write(trash.data_file(OsStr::new("x.txt")), "orphan").unwrap();
        let file = tmp.path().join("x.txt");
        fs::write(&file, "new").unwrap();

        assert!(service.move_to_trash(&file).unwrap());

        assert_eq!(fs::read_to_string(trash.data_file(OsStr::new("x.txt"))).unwrap(), "orphan");
        assert!(!trash.info_file(OsStr::new("x.txt")).exists());
        assert_eq!(fs::read_to_string(trash.data_file(OsStr::new("x.txt_1"))).unwrap(), "new");
    }

    #[test]
    fn restore_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let err = service(&tmp)
            .restore_from_trash_default(&tmp.path().join("x"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported(_)));
    }
}
