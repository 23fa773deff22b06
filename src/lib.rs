//! Freedesktop.org desktop integration for Linux: the home trash and the
//! shared thumbnail cache, plus the XDG folder resolution and platform
//! detection both depend on.

pub mod errors;
pub mod fs;
pub mod helpers;
pub mod lazy;
pub mod lock;
pub mod models;
pub mod platform;
pub mod thumbnails;
pub mod trash;

pub use errors::{CoreError, Result};
pub use fs::{FileSystem, RealFileSystem};
pub use helpers::{
    build_unique_basename,
    parse_trash_datetime,
    DIRECTORY_SIZES_FILE,
    TRASHINFO_EXTENSION,
    TRASHINFO_TIME_FORMAT,
};
pub use lazy::LazyInitialized;
pub use models::{
    CollisionAction,
    DirectorySizeEntry,
    TrashDirectory,
    TrashInfoRecord,
};
pub use platform::{Platform, PlatformFolders, XdgFolders};
pub use thumbnails::{
    ImageThumbnailGenerator,
    ThumbnailGenerator,
    ThumbnailMetaData,
    ThumbnailService,
    ThumbnailSize,
};
pub use trash::TrashService;

/// Re-export a small stable API surface for command crates.
pub mod prelude {
    pub use crate::{
        errors::{CoreError, Result},
        models::*,
        platform::{Platform, PlatformFolders, XdgFolders},
        thumbnails::{ImageThumbnailGenerator, ThumbnailGenerator, ThumbnailService, ThumbnailSize},
        trash::TrashService,
    };
}
