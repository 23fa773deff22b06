//! Shared utility helpers for the trash and thumbnail protocols.

use crate::errors::CoreError;
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::ffi::{CString, OsStr, OsString};
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// File extension used by trash info files.
pub const TRASHINFO_EXTENSION: &str = ".trashinfo";

/// Deletion date format mandated for trash info metadata.
pub const TRASHINFO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Name of the shared directory size ledger inside a trash root.
pub const DIRECTORY_SIZES_FILE: &str = "directorysizes";

/// Builds the candidate base name for the `attempt`-th naming try.
///
/// Attempt 0 is the original name, later attempts append `_<attempt>`.
pub fn build_unique_basename(file_name: &OsStr, attempt: u64) -> OsString {
    let mut name = file_name.to_os_string();
    if attempt > 0 {
        name.push(format!("_{attempt}"));
    }
    name
}

/// Parses a `DeletionDate` value (local time, second precision).
pub fn parse_trash_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TRASHINFO_TIME_FORMAT).ok()
}

/// Converts a wall-clock time into a local `DeletionDate`, truncated to seconds.
pub fn local_deletion_date(time: SystemTime) -> NaiveDateTime {
    let local = DateTime::<Local>::from(time).naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

/// Milliseconds since the epoch, clamped to zero for pre-epoch times.
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Whole seconds since the epoch, clamped to zero for pre-epoch times.
pub fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Percent-encodes a single name. Spaces become `%20`, never `+`.
pub fn encode_name(name: &[u8]) -> String {
    urlencoding::encode_binary(name).into_owned()
}

/// Percent-encodes an absolute path for the `Path=` key, keeping `/` literal.
pub fn encode_trash_path(path: &Path) -> String {
    path.as_os_str()
        .as_bytes()
        .split(|b| *b == b'/')
        .map(encode_name)
        .collect::<Vec<_>>()
        .join("/")
}

/// Reverses [`encode_trash_path`] (and any other percent-encoding).
pub fn decode_trash_path(value: &str) -> PathBuf {
    let bytes: Cow<'_, [u8]> = urlencoding::decode_binary(value.as_bytes());
    PathBuf::from(OsString::from_vec(bytes.into_owned()))
}

/// Sums the sizes of all regular files below `dir`, not following symlinks.
pub fn directory_size(dir: &Path) -> crate::Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            CoreError::io(path, io::Error::from(err))
        })?;
        if entry.file_type().is_file() {
            let meta = entry
                .metadata()
                .map_err(|err| CoreError::io(entry.path(), io::Error::from(err)))?;
            total += meta.len();
        }
    }
    Ok(total)
}

/// Checks effective access rights with `access(2)`.
fn has_access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

pub fn is_writable(path: &Path) -> bool {
    has_access(path, libc::W_OK)
}

pub fn is_readable(path: &Path) -> bool {
    has_access(path, libc::R_OK)
}

pub fn is_searchable(path: &Path) -> bool {
    has_access(path, libc::X_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unique_basename_appends_counter_after_extension() {
        let name = OsStr::new("notes.txt");
        assert_eq!(build_unique_basename(name, 0), "notes.txt");
        assert_eq!(build_unique_basename(name, 1), "notes.txt_1");
        assert_eq!(build_unique_basename(name, 12), "notes.txt_12");
    }

    #[test]
    fn encode_path_uses_percent_twenty_for_spaces() {
        let encoded = encode_trash_path(Path::new("/home/user/my file+1.txt"));
        assert_eq!(encoded, "/home/user/my%20file%2B1.txt");
        assert!(!encoded.contains('+'));
    }

    #[test]
    fn decode_reverses_encode_for_non_ascii() {
        let path = Path::new("/tmp/Größe & Co/ü.txt");
        assert_eq!(decode_trash_path(&encode_trash_path(path)), path);
    }

    #[test]
    fn deletion_date_is_second_precision() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);
        let date = local_deletion_date(time);
        let text = date.format(TRASHINFO_TIME_FORMAT).to_string();
        assert_eq!(text.len(), 19);
        assert_eq!(&text[10..11], "T");
        assert_eq!(parse_trash_datetime(&text), Some(date));
    }

    #[test]
    fn epoch_conversions_truncate() {
        let time = UNIX_EPOCH + Duration::from_millis(12_345);
        assert_eq!(epoch_millis(time), 12_345);
        assert_eq!(epoch_seconds(time), 12);
    }

    #[test]
    fn directory_size_counts_nested_regular_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a"), vec![0u8; 10]).unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub").join("b"), vec![0u8; 32]).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a"), tmp.path().join("link")).unwrap();

        assert_eq!(directory_size(tmp.path()).unwrap(), 42);
    }
}
