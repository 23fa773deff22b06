use std::{io, path::PathBuf};

/// Error type shared by the trash and thumbnail services.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// File system I/O failure.
    #[error("I/O error while accessing {0}")]
    Io(PathBuf, #[source] io::Error),

    /// A path is invalid for the current operation.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An operation was rejected due to argument issues.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Rendering or buffer handling of a thumbnail image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing a thumbnail PNG failed.
    #[error("failed to encode thumbnail {0}")]
    PngEncode(PathBuf, #[source] png::EncodingError),

    /// Reading a thumbnail PNG failed.
    #[error("failed to decode thumbnail {0}")]
    PngDecode(PathBuf, #[source] png::DecodingError),

    /// Operation or platform not available in this environment.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::Io(path.into(), error)
    }

    /// Returns the underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(_, err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Shared result alias for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_displays_path() {
        let err = CoreError::io("/missing/file", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "I/O error while accessing /missing/file");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn unsupported_displays_message() {
        let err = CoreError::unsupported("restore from trash");
        assert_eq!(err.to_string(), "unsupported: restore from trash");
        assert_eq!(err.io_kind(), None);
    }
}
