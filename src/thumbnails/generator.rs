use super::metadata::ThumbnailMetaData;
use crate::errors::CoreError;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::path::Path;

/// Paints thumbnails for one family of source files.
///
/// The cache service owns naming, freshness and publication. Implementations
/// only describe and render the source.
pub trait ThumbnailGenerator {
    /// MIME type of the source file.
    fn content_type(&self, file: &Path) -> crate::Result<String>;

    /// Natural size of the source, used to keep the aspect ratio.
    ///
    /// `None` produces a square thumbnail.
    fn natural_dimensions(&self, file: &Path) -> crate::Result<Option<(u32, u32)>>;

    /// Paints the source into `canvas` and returns the finished image.
    ///
    /// Implementations record the natural width and height in `meta`.
    fn paint(
        &self,
        file: &Path,
        canvas: RgbaImage,
        meta: &mut ThumbnailMetaData,
    ) -> crate::Result<RgbaImage>;
}

/// Generator for still images decodable by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageThumbnailGenerator;

const UNKNOWN_MIME: &str = "application/octet-stream";

impl ThumbnailGenerator for ImageThumbnailGenerator {
    fn content_type(&self, file: &Path) -> crate::Result<String> {
        Ok(ImageFormat::from_path(file)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| UNKNOWN_MIME.to_string()))
    }

    fn natural_dimensions(&self, file: &Path) -> crate::Result<Option<(u32, u32)>> {
        match image::image_dimensions(file) {
            Ok(dimensions) => Ok(Some(dimensions)),
            Err(image::ImageError::IoError(err)) => Err(CoreError::io(file, err)),
            Err(err) => {
                tracing::debug!("no dimensions for {}: {err}", file.display());
                Ok(None)
            }
        }
    }

    fn paint(
        &self,
        file: &Path,
        mut canvas: RgbaImage,
        meta: &mut ThumbnailMetaData,
    ) -> crate::Result<RgbaImage> {
        let source = image::open(file)?;
        meta.width = source.width();
        meta.height = source.height();

        let scaled = imageops::resize(&source, canvas.width(), canvas.height(), FilterType::Triangle);
        imageops::replace(&mut canvas, &scaled, 0, 0);
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn content_type_follows_extension() {
        let generator = ImageThumbnailGenerator;
        assert_eq!(generator.content_type(Path::new("/x/a.PNG")).unwrap(), "image/png");
        assert_eq!(generator.content_type(Path::new("/x/a.jpg")).unwrap(), "image/jpeg");
        assert_eq!(generator.content_type(Path::new("/x/a.unknown")).unwrap(), UNKNOWN_MIME);
    }

    #[test]
    fn paints_scaled_source_and_records_natural_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("red.png");
        RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let generator = ImageThumbnailGenerator;
        assert_eq!(generator.natural_dimensions(&path).unwrap(), Some((40, 20)));

        let mut meta = ThumbnailMetaData::default();
        let image = generator.paint(&path, RgbaImage::new(8, 4), &mut meta).unwrap();

        assert_eq!((meta.width, meta.height), (40, 20));
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(4, 2), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn undecodable_source_has_no_dimensions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        assert_eq!(ImageThumbnailGenerator.natural_dimensions(&path).unwrap(), None);
    }
}
