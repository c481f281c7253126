//! Image format identity and the per-format operation table.
//!
//! Every format the pipeline recognizes has exactly one [`FormatProfile`]
//! describing how it is compressed in place and which modern formats it may
//! be exported to. The processor consumes this table instead of branching on
//! file extensions.

use crate::constants::{AVIF_QUALITY, JPEG_QUALITY, SVG_MAX_PASSES};
use std::fmt;

/// Recognized image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageFormat {
    Svg,
    Png,
    Jpeg,
    WebP,
    Avif,
    Gif,
}

impl ImageFormat {
    /// Bucket order used when logging candidate counts.
    pub const ALL: [ImageFormat; 6] = [
        ImageFormat::Svg,
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::WebP,
        ImageFormat::Avif,
        ImageFormat::Gif,
    ];

    /// File name suffixes that map to this format. Matching is exact and
    /// case-sensitive.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Svg => &[".svg"],
            ImageFormat::Png => &[".png"],
            ImageFormat::Jpeg => &[".jpg", ".jpeg"],
            ImageFormat::WebP => &[".webp"],
            ImageFormat::Avif => &[".avif"],
            ImageFormat::Gif => &[".gif"],
        }
    }

    /// Canonical extension, used when this format is an export target.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::WebP => "webp",
            ImageFormat::Avif => "avif",
            ImageFormat::Gif => "gif",
        }
    }

    /// Classify a repository path by its suffix.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.matched_suffix(path).is_some())
    }

    /// The suffix of `path` that identifies it as this format, if any.
    /// Only the last path component is considered, so a bare suffix such as
    /// `dir/.png` is not an image.
    pub fn matched_suffix(&self, path: &str) -> Option<&'static str> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.suffixes()
            .iter()
            .copied()
            .find(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix))
    }

    pub fn profile(&self) -> &'static FormatProfile {
        match self {
            ImageFormat::Svg => &SVG_PROFILE,
            ImageFormat::Png => &PNG_PROFILE,
            ImageFormat::Jpeg => &JPEG_PROFILE,
            ImageFormat::WebP => &WEBP_PROFILE,
            ImageFormat::Avif => &AVIF_PROFILE,
            ImageFormat::Gif => &GIF_PROFILE,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Svg => "SVG",
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPG",
            ImageFormat::WebP => "WEBP",
            ImageFormat::Avif => "AVIF",
            ImageFormat::Gif => "GIF",
        };
        write!(f, "{}", name)
    }
}

/// Modern formats a raster source can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportTarget {
    WebP,
    Avif,
}

impl ExportTarget {
    pub fn format(&self) -> ImageFormat {
        match self {
            ExportTarget::WebP => ImageFormat::WebP,
            ExportTarget::Avif => ImageFormat::Avif,
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Encoder settings requested from a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Structure-preserving markup minification, repeated until stable.
    Minify { max_passes: usize },
    /// Bit-exact pixels.
    Lossless,
    /// Visually lossless; `animated` keeps every frame.
    NearLossless { animated: bool },
    /// Lossy at a fixed quality.
    Lossy { quality: u8, progressive: bool },
}

/// How one export target is produced from a source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRule {
    pub target: ExportTarget,
    pub encoding: Encoding,
}

/// Operation table entry for a single format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    pub format: ImageFormat,
    /// In-place re-encode settings. `None` when no encoder can read this
    /// format back, so candidates of it are never re-encoded in place.
    pub compress: Option<Encoding>,
    /// Export targets, in the order they run.
    pub exports: &'static [ExportRule],
}

impl FormatProfile {
    /// A WebP export exists for this format, so the original can be
    /// replaced by it.
    pub fn is_replaceable(&self) -> bool {
        self.exports
            .iter()
            .any(|rule| rule.target == ExportTarget::WebP)
    }
}

const AVIF_EXPORT: ExportRule = ExportRule {
    target: ExportTarget::Avif,
    encoding: Encoding::Lossy {
        quality: AVIF_QUALITY,
        progressive: false,
    },
};

static SVG_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::Svg,
    compress: Some(Encoding::Minify {
        max_passes: SVG_MAX_PASSES,
    }),
    exports: &[],
};

static PNG_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::Png,
    compress: Some(Encoding::Lossless),
    exports: &[
        ExportRule {
            target: ExportTarget::WebP,
            encoding: Encoding::Lossless,
        },
        AVIF_EXPORT,
    ],
};

static JPEG_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::Jpeg,
    compress: Some(Encoding::Lossy {
        quality: JPEG_QUALITY,
        progressive: false,
    }),
    exports: &[
        ExportRule {
            target: ExportTarget::WebP,
            encoding: Encoding::NearLossless { animated: false },
        },
        AVIF_EXPORT,
    ],
};

static WEBP_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::WebP,
    compress: Some(Encoding::NearLossless { animated: true }),
    exports: &[AVIF_EXPORT],
};

static AVIF_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::Avif,
    compress: None,
    exports: &[],
};

static GIF_PROFILE: FormatProfile = FormatProfile {
    format: ImageFormat::Gif,
    compress: Some(Encoding::NearLossless { animated: true }),
    exports: &[ExportRule {
        target: ExportTarget::WebP,
        encoding: Encoding::NearLossless { animated: true },
    }],
};

/// Name of the file an export of `source` will produce: the matched source
/// suffix is replaced by the target extension, never appended to.
pub fn derived_name(source: &str, format: ImageFormat, target: ExportTarget) -> String {
    let stem = format
        .matched_suffix(source)
        .and_then(|suffix| source.strip_suffix(suffix))
        .unwrap_or(source);
    format!("{}.{}", stem, target.format().extension())
}
