use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Thumbnail size classes of the freedesktop Thumbnail Managing Standard.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum ThumbnailSize {
    Normal,
    #[default]
    Large,
    XLarge,
    XxLarge,
}

impl ThumbnailSize {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Large, Self::XLarge, Self::XxLarge];

    /// Edge length in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            Self::Normal => 128,
            Self::Large => 256,
            Self::XLarge => 512,
            Self::XxLarge => 1024,
        }
    }

    /// Directory below the cache root holding this size class.
    pub fn subfolder(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Large => "large",
            Self::XLarge => "x-large",
            Self::XxLarge => "xx-large",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.subfolder() == name)
    }

    /// Scales natural dimensions so the longer edge equals [`Self::pixels`].
    ///
    /// Unknown or degenerate dimensions yield a square.
    pub fn target_dimensions(self, natural: Option<(u32, u32)>) -> (u32, u32) {
        let edge = self.pixels();
        match natural {
            Some((width, height)) if width > 0 && height > 0 => {
                let scale = f64::min(
                    f64::from(edge) / f64::from(width),
                    f64::from(edge) / f64::from(height),
                );
                let scaled = |v: u32| ((f64::from(v) * scale) as u32).clamp(1, edge);
                (scaled(width), scaled(height))
            }
            _ => (edge, edge),
        }
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subfolder())
    }
}

impl FromStr for ThumbnailSize {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value).ok_or_else(|| {
            CoreError::invalid_input(format!(
                "unknown thumbnail size '{value}' (expected normal, large, x-large or xx-large)"
            ))
        })
    }
}
