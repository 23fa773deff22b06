use crate::helpers::{
    decode_trash_path, encode_name, encode_trash_path, parse_trash_datetime,
    DIRECTORY_SIZES_FILE, TRASHINFO_EXTENSION, TRASHINFO_TIME_FORMAT,
};
use chrono::NaiveDateTime;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// A trash directory laid out per the freedesktop Trash specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashDirectory {
    pub path: PathBuf,
    pub files_dir: PathBuf,
    pub info_dir: PathBuf,
}

impl TrashDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            files_dir: path.join("files"),
            info_dir: path.join("info"),
            path,
        }
    }

    /// Path of the shared `directorysizes` ledger.
    pub fn directory_sizes(&self) -> PathBuf {
        self.path.join(DIRECTORY_SIZES_FILE)
    }

    /// Sidecar path for a trashed name.
    pub fn info_file(&self, trashed_name: &OsStr) -> PathBuf {
        let mut file_name = trashed_name.to_os_string();
        file_name.push(TRASHINFO_EXTENSION);
        self.info_dir.join(file_name)
    }

    /// Data path for a trashed name.
    pub fn data_file(&self, trashed_name: &OsStr) -> PathBuf {
        self.files_dir.join(trashed_name)
    }
}

/// Contents of one `.trashinfo` sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashInfoRecord {
    pub original_path: PathBuf,
    pub deletion_date: NaiveDateTime,
    pub trashed_name: OsString,
}

impl TrashInfoRecord {
    pub fn render(&self) -> String {
        format!(
            "[Trash Info]\nPath={}\nDeletionDate={}\n",
            encode_trash_path(&self.original_path),
            self.deletion_date.format(TRASHINFO_TIME_FORMAT)
        )
    }

    /// Parses sidecar text. The trashed name comes from the sidecar's file name.
    pub fn parse(trashed_name: &OsStr, contents: &str) -> Option<Self> {
        let mut lines = contents.lines().map(str::trim);
        if lines.next()? != "[Trash Info]" {
            return None;
        }
        let mut original_path = None;
        let mut deletion_date = None;
        for line in lines {
            if let Some(value) = line.strip_prefix("Path=") {
                original_path.get_or_insert_with(|| decode_trash_path(value));
            } else if let Some(value) = line.strip_prefix("DeletionDate=") {
                if deletion_date.is_none() {
                    deletion_date = parse_trash_datetime(value);
                }
            }
        }
        Some(Self {
            original_path: original_path?,
            deletion_date: deletion_date?,
            trashed_name: trashed_name.to_os_string(),
        })
    }
}

/// One line of the `directorysizes` ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySizeEntry {
    pub size_bytes: u64,
    pub info_mtime_millis: u64,
    pub encoded_name: String,
}

impl DirectorySizeEntry {
    pub fn new(size_bytes: u64, info_mtime_millis: u64, name: &Path) -> Self {
        Self {
            size_bytes,
            info_mtime_millis,
            encoded_name: encode_name(name.as_os_str().as_bytes()),
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}\n",
            self.size_bytes, self.info_mtime_millis, self.encoded_name
        )
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end().splitn(3, ' ');
        Some(Self {
            size_bytes: fields.next()?.parse().ok()?,
            info_mtime_millis: fields.next()?.parse().ok()?,
            encoded_name: fields.next()?.to_string(),
        })
    }
}

/// Answer of a restore collision resolver.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CollisionAction {
    Overwrite,
    Rename,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trash_directory_layout() {
        let dir = TrashDirectory::new("/home/u/.local/share/Trash");
        let name = OsStr::new("a b");
        assert_eq!(dir.info_file(name), PathBuf::from("/home/u/.local/share/Trash/info/a b.trashinfo"));
        assert_eq!(dir.data_file(name), PathBuf::from("/home/u/.local/share/Trash/files/a b"));
        assert_eq!(dir.directory_sizes(), PathBuf::from("/home/u/.local/share/Trash/directorysizes"));
    }

    #[test]
    fn trashinfo_render_then_parse() {
        let record = TrashInfoRecord {
            original_path: PathBuf::from("/home/u/My Docs/report.txt"),
            deletion_date: parse_trash_datetime("2024-03-01T09:15:30").unwrap(),
            trashed_name: OsString::from("report.txt_2"),
        };
        let text = record.render();
        assert_eq!(
            text,
            "[Trash Info]\nPath=/home/u/My%20Docs/report.txt\nDeletionDate=2024-03-01T09:15:30\n"
        );
        assert_eq!(TrashInfoRecord::parse(OsStr::new("report.txt_2"), &text), Some(record));
    }

    #[test]
    fn trashinfo_without_header_is_rejected() {
        assert_eq!(TrashInfoRecord::parse(OsStr::new("x"), "Path=/x\nDeletionDate=2024-03-01T09:15:30\n"), None);
    }

    #[test]
    fn directory_size_line_format() {
        let entry = DirectorySizeEntry::new(4096, 1_700_000_000_123, Path::new("my dir"));
        assert_eq!(entry.to_line(), "4096 1700000000123 my%20dir\n");
        assert_eq!(DirectorySizeEntry::parse_line(&entry.to_line()), Some(entry));
    }
}
