//! freedesktop.org Thumbnail Managing Standard.
//!
//! Cache entries live under `<cache root>/<size>/<md5 of uri>.png` and carry
//! their freshness data (`Thumb::MTime`, `Thumb::URI`, ...) inside the PNG,
//! so every tool sharing the cache agrees on validity from the file alone.

mod cache;
pub mod generator;
pub mod key;
pub mod metadata;
mod size;

pub use cache::ThumbnailService;
pub use generator::{ImageThumbnailGenerator, ThumbnailGenerator};
pub use key::{file_uri, ThumbnailKey};
pub use metadata::{decode_png, encode_png, DecodedThumbnail, ThumbnailMetaData};
pub use size::ThumbnailSize;
