//! Thumbnail metadata tags and their PNG text-chunk encoding.
//!
//! See <https://specifications.freedesktop.org/thumbnail-spec/latest/> for
//! the tag set. Absent values are never written, and unreadable numbers
//! decode as zero.

use image::RgbaImage;
use png::{BitDepth, ColorType, DecodingError, EncodingError};
use std::io::{Read, Write};

pub const THUMB_URI: &str = "Thumb::URI";
pub const THUMB_MTIME: &str = "Thumb::MTime";
pub const THUMB_SIZE: &str = "Thumb::Size";
pub const THUMB_MIMETYPE: &str = "Thumb::Mimetype";
pub const THUMB_WIDTH: &str = "Thumb::Image::Width";
pub const THUMB_HEIGHT: &str = "Thumb::Image::Height";
pub const THUMB_PAGES: &str = "Thumb::Document::Pages";
pub const THUMB_LENGTH: &str = "Thumb::Movie::Length";
pub const THUMB_DESCRIPTION: &str = "Description";
pub const THUMB_SOFTWARE: &str = "Software";

pub const META_NAMES: [&str; 10] = [
    THUMB_URI,
    THUMB_MTIME,
    THUMB_SIZE,
    THUMB_MIMETYPE,
    THUMB_WIDTH,
    THUMB_HEIGHT,
    THUMB_PAGES,
    THUMB_LENGTH,
    THUMB_DESCRIPTION,
    THUMB_SOFTWARE,
];

/// Metadata embedded in a cached thumbnail.
///
/// Zero and `None` mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailMetaData {
    pub uri: Option<String>,
    /// Source modification time in whole seconds since the epoch.
    pub mtime: u64,
    /// Source size in bytes.
    pub size: u64,
    pub mime: Option<String>,
    /// Natural width of the source.
    pub width: u32,
    /// Natural height of the source.
    pub height: u32,
    pub pages: u32,
    /// Movie length in seconds.
    pub length: u64,
    pub software: Option<String>,
    pub description: Option<String>,
}

fn text_entry(key: &'static str, value: &Option<String>) -> Option<(&'static str, String)> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| (key, v.to_string()))
}

fn number_entry<N: Into<u64>>(key: &'static str, value: N) -> Option<(&'static str, String)> {
    let value = value.into();
    (value > 0).then(|| (key, value.to_string()))
}

impl ThumbnailMetaData {
    /// Populated tags in a stable order.
    pub fn to_entries(&self) -> Vec<(&'static str, String)> {
        [
            text_entry(THUMB_URI, &self.uri),
            number_entry(THUMB_MTIME, self.mtime),
            number_entry(THUMB_SIZE, self.size),
            text_entry(THUMB_MIMETYPE, &self.mime),
            number_entry(THUMB_WIDTH, self.width),
            number_entry(THUMB_HEIGHT, self.height),
            number_entry(THUMB_PAGES, self.pages),
            number_entry(THUMB_LENGTH, self.length),
            text_entry(THUMB_SOFTWARE, &self.software),
            text_entry(THUMB_DESCRIPTION, &self.description),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Builds metadata from keyword/text pairs, ignoring unknown keywords.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut meta = Self::default();
        for (key, value) in entries {
            let value = value.as_ref();
            let text = || (!value.is_empty()).then(|| value.to_string());
            match key.as_ref() {
                THUMB_URI => meta.uri = text(),
                THUMB_MTIME => meta.mtime = value.trim().parse().unwrap_or(0),
                THUMB_SIZE => meta.size = value.trim().parse().unwrap_or(0),
                THUMB_MIMETYPE => meta.mime = text(),
                THUMB_WIDTH => meta.width = value.trim().parse().unwrap_or(0),
                THUMB_HEIGHT => meta.height = value.trim().parse().unwrap_or(0),
                THUMB_PAGES => meta.pages = value.trim().parse().unwrap_or(0),
                THUMB_LENGTH => meta.length = value.trim().parse().unwrap_or(0),
                THUMB_SOFTWARE => meta.software = text(),
                THUMB_DESCRIPTION => meta.description = text(),
                _ => {}
            }
        }
        meta
    }
}

/// Writes `image` as an 8-bit RGBA PNG carrying `meta` as text chunks.
pub fn encode_png<W: Write>(
    writer: W,
    image: &RgbaImage,
    meta: &ThumbnailMetaData,
) -> Result<(), EncodingError> {
    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    for (key, value) in meta.to_entries() {
        // tEXt is Latin-1 only.
        if value.is_ascii() {
            encoder.add_text_chunk(key.to_string(), value)?;
        } else {
            encoder.add_itxt_chunk(key.to_string(), value)?;
        }
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()
}

/// A fully decoded cache file: its metadata and pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedThumbnail {
    pub meta: ThumbnailMetaData,
    pub width: u32,
    pub height: u32,
}

/// Decodes a PNG's pixel data and extracts the thumbnail tags preceding it.
///
/// Any structural problem in the file is reported as an error so callers can
/// treat the entry as corrupt.
pub fn decode_png<R: Read>(reader: R) -> Result<DecodedThumbnail, DecodingError> {
    let decoder = png::Decoder::new(reader);
    let mut reader = decoder.read_info()?;
    let mut pixels = vec![0; reader.output_buffer_size()];
    reader.next_frame(&mut pixels)?;

    let info = reader.info();
    let mut entries: Vec<(String, String)> = info
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect();
    for chunk in &info.compressed_latin1_text {
        entries.push((chunk.keyword.clone(), chunk.get_text()?));
    }
    for chunk in &info.utf8_text {
        entries.push((chunk.keyword.clone(), chunk.get_text()?));
    }

    Ok(DecodedThumbnail {
        meta: ThumbnailMetaData::from_entries(entries),
        width: info.width,
        height: info.height,
    })
}
