//! Image type sniffing.
//!
//! Servers routinely lie about `Content-Type` (or send HTML error pages
//! with a 200), so the leading bytes of every download are sniffed and the
//! sniffed type wins over the declared one.

use image::ImageFormat;

/// Number of leading bytes collected before classifying a download.
pub const SNIFF_LEN: usize = 32;

/// Image types accepted as cover art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
        }
    }

    /// Preferred file extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Jpeg => "jpg",
            ImageType::Png => "png",
        }
    }

    /// Parse a MIME type, ignoring parameters such as `; charset=...`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageType::Jpeg),
            "image/png" => Some(ImageType::Png),
            _ => None,
        }
    }

    /// Map a file extension (`jpg`, `JPEG`, `png`) to a type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageType::Jpeg),
            "png" => Some(ImageType::Png),
            _ => None,
        }
    }
}

/// Determine the image type from magic bytes alone.
///
/// Formats the decoder recognizes but that are not acceptable as cover art
/// (GIF, WebP, ...) sniff as `None` too.
pub fn sniff(header: &[u8]) -> Option<ImageType> {
    match image::guess_format(header).ok()? {
        ImageFormat::Jpeg => Some(ImageType::Jpeg),
        ImageFormat::Png => Some(ImageType::Png),
        _ => None,
    }
}

/// Outcome of classifying a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub image_type: ImageType,
    /// The server declared something other than what was sniffed
    pub corrected: bool,
}

/// Classify a download from its leading bytes and declared `Content-Type`.
///
/// The sniffed type takes precedence. If sniffing is inconclusive the
/// declared type is used. Anything outside the allowed set is rejected.
pub fn classify(header: &[u8], declared: Option<&str>) -> Option<Classification> {
    let declared_type = declared.and_then(ImageType::from_mime);

    match sniff(header) {
        Some(image_type) => Some(Classification {
            image_type,
            corrected: declared.is_some() && declared_type != Some(image_type),
        }),
        None if looks_like_known_non_image(header) => None,
        None => declared_type.map(|image_type| Classification {
            image_type,
            corrected: false,
        }),
    }
}

/// Bytes that `image` recognizes as some other format. Those never fall
/// back to the declared type, since the content is known not to match.
fn looks_like_known_non_image(header: &[u8]) -> bool {
    image::guess_format(header).is_ok()
}
