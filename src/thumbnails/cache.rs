//! Lookup, validation, regeneration and publication of cached thumbnails.

use super::generator::ThumbnailGenerator;
use super::key::{file_uri, ThumbnailKey};
use super::metadata::{decode_png, encode_png, ThumbnailMetaData};
use super::size::ThumbnailSize;
use crate::errors::CoreError;
use crate::helpers::{epoch_seconds, is_readable};
use crate::platform::PlatformFolders;
use image::RgbaImage;
use std::fs::{self, DirBuilder, File, Permissions};
use std::io::{self, BufReader, BufWriter, Write};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = "tmpThumb";

/// A canonical source file and the facts the cache needs about it.
struct Source {
    path: PathBuf,
    uri: String,
    mtime: u64,
    len: u64,
}

impl Source {
    fn resolve(file: &Path) -> crate::Result<Self> {
        let path = fs::canonicalize(file).map_err(|err| CoreError::io(file, err))?;
        let meta = fs::metadata(&path).map_err(|err| CoreError::io(&path, err))?;
        if !meta.is_file() {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "not a regular file");
            return Err(CoreError::io(&path, err));
        }
        if !is_readable(&path) {
            let err = io::Error::new(io::ErrorKind::PermissionDenied, "not readable");
            return Err(CoreError::io(&path, err));
        }
        let modified = meta.modified().map_err(|err| CoreError::io(&path, err))?;
        Ok(Self {
            uri: file_uri(&path)?,
            mtime: epoch_seconds(modified),
            len: meta.len(),
            path,
        })
    }
}

/// Thumbnail cache shared with every other tool following the freedesktop
/// Thumbnail Managing Standard.
///
/// No locks are taken: concurrent writers for the same entry race, and the
/// atomic rename in the same directory means the last one wins while readers
/// only ever see complete files.
pub struct ThumbnailService {
    folders: Arc<dyn PlatformFolders>,
}

impl ThumbnailService {
    pub fn new(folders: Arc<dyn PlatformFolders>) -> Self {
        Self { folders }
    }

    /// Location where the thumbnail of `file` is (or would be) cached.
    pub fn cache_path(&self, file: &Path, size: ThumbnailSize) -> crate::Result<PathBuf> {
        let source = Source::resolve(file)?;
        Ok(self.entry_path(&source, size))
    }

    fn entry_path(&self, source: &Source, size: ThumbnailSize) -> PathBuf {
        self.folders
            .thumbnail_folder()
            .join(size.subfolder())
            .join(ThumbnailKey::from_uri(&source.uri).file_name())
    }

    /// Returns the path of an up-to-date thumbnail for `file`, rendering it
    /// with `generator` when the cache has no valid entry.
    ///
    /// `size` defaults to [`ThumbnailSize::Large`].
    pub fn get_thumbnail(
        &self,
        file: &Path,
        size: Option<ThumbnailSize>,
        generator: &dyn ThumbnailGenerator,
    ) -> crate::Result<PathBuf> {
        let size = size.unwrap_or_default();
        let source = Source::resolve(file)?;
        let thumb_path = self.entry_path(&source, size);
        let thumb_dir = thumb_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| CoreError::invalid_path(thumb_path.display().to_string()))?;
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(&thumb_dir)
            .map_err(|err| CoreError::io(&thumb_dir, err))?;

        if cached_mtime(&thumb_path)? == Some(source.mtime) {
            debug!("thumbnail cache hit for {}", source.uri);
            return Ok(thumb_path);
        }

        debug!("rendering {size} thumbnail for {}", source.uri);
        let (image, meta) = render(&source, size, generator)?;
        publish(&thumb_dir, &thumb_path, &image, &meta)?;
        Ok(thumb_path)
    }
}

/// Embedded `Thumb::MTime` of a cached entry, or `None` when there is no usable entry.
///
/// Undecodable entries are deleted on the spot.
fn cached_mtime(thumb_path: &Path) -> crate::Result<Option<u64>> {
    let file = match File::open(thumb_path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            warn!("cannot read cached thumbnail {}: {err}", thumb_path.display());
            return Ok(None);
        }
    };
    match decode_png(BufReader::new(file)) {
        Ok(decoded) => Ok(Some(decoded.meta.mtime)),
        Err(err) => {
            let err = CoreError::PngDecode(thumb_path.to_path_buf(), err);
            warn!("removing corrupt entry: {err}");
            match fs::remove_file(thumb_path) {
                Ok(()) => Ok(None),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(CoreError::io(thumb_path, err)),
            }
        }
    }
}

fn render(
    source: &Source,
    size: ThumbnailSize,
    generator: &dyn ThumbnailGenerator,
) -> crate::Result<(RgbaImage, ThumbnailMetaData)> {
    let natural = generator.natural_dimensions(&source.path)?;
    let (width, height) = size.target_dimensions(natural);
    let mut meta = ThumbnailMetaData {
        uri: Some(source.uri.clone()),
        mtime: source.mtime,
        size: source.len,
        mime: Some(generator.content_type(&source.path)?),
        ..Default::default()
    };
    let image = generator.paint(&source.path, RgbaImage::new(width, height), &mut meta)?;
    if meta.width == 0 || meta.height == 0 {
        if let Some((w, h)) = natural {
            meta.width = w;
            meta.height = h;
        }
    }
    Ok((image, meta))
}

/// Writes to a private temp file next to `thumb_path`, then renames it into place.
///
/// The temp file is removed on every failure path.
fn publish(
    thumb_dir: &Path,
    thumb_path: &Path,
    image: &RgbaImage,
    meta: &ThumbnailMetaData,
) -> crate::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".png")
        .tempfile_in(thumb_dir)
        .map_err(|err| CoreError::io(thumb_dir, err))?;
    let tmp_path = tmp.path().to_path_buf();

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        encode_png(&mut writer, image, meta).map_err(|err| CoreError::PngEncode(tmp_path.clone(), err))?;
        writer.flush().map_err(|err| CoreError::io(&tmp_path, err))?;
    }
    tmp.as_file()
        .set_permissions(Permissions::from_mode(0o600))
        .map_err(|err| CoreError::io(&tmp_path, err))?;

    tmp.persist(thumb_path)
        .map_err(|err| CoreError::io(thumb_path, err.error))?;
    Ok(())
}
