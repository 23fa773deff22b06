use crate::errors::CoreError;
use md5::{Digest, Md5};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// RFC 2396 `pchar` plus `/`: what GLib's `g_filename_to_uri` leaves literal.
const URI_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'/');

/// MD5 of a file's canonical URI, naming its cache entry.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ThumbnailKey([u8; 16]);

impl ThumbnailKey {
    pub fn from_uri(uri: &str) -> Self {
        let digest = Md5::digest(uri.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 32 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Cache file name, `<hex>.png`.
    pub fn file_name(&self) -> String {
        format!("{}.png", self.to_hex())
    }
}

impl fmt::Display for ThumbnailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// `file://` URI of an absolute path, escaped the way other thumbnailers
/// escape it so cache names agree.
///
/// Bytes outside the allowed set, including non-UTF-8 ones, become `%XX`.
pub fn file_uri(path: &Path) -> crate::Result<String> {
    if !path.is_absolute() {
        return Err(CoreError::invalid_path(format!(
            "not an absolute path: {}",
            path.display()
        )));
    }
    Ok(format!(
        "file://{}",
        percent_encode(path.as_os_str().as_bytes(), URI_PATH)
    ))
}
