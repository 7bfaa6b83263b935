//! # External Resources
//!
//! Images and fonts arrive as data URIs, bare base64 or file paths. Layout
//! only needs an image's pixel size, so pixels are never decoded: the
//! `image` crate identifies the container and reads its header.

use image::ImageFormat;
use std::io::Cursor;

/// Pixel size and container of an image source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub width_px: u32,
    pub height_px: u32,
    pub format: ImageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Load an image source far enough to know its size.
pub fn load_image_info(src: &str) -> Result<ImageInfo, String> {
    let bytes = read_source_bytes(src)?;
    probe_image(&bytes)
}

/// Turn a `src` string into bytes.
///
/// `data:` URIs decode their payload. Strings starting with `/`, `./` or
/// `../` are read from disk. Anything else is taken to be bare base64,
/// which is why a path needs one of those prefixes.
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if let Some(uri) = src.strip_prefix("data:") {
        let (_, payload) = uri
            .split_once(',')
            .ok_or_else(|| format!("Data URI has no payload: '{}'", truncate(src)))?;
        return decode_base64(payload);
    }

    let is_path = ["/", "./", "../"].iter().any(|p| src.starts_with(p));
    if is_path {
        return std::fs::read(src).map_err(|e| format!("Cannot read '{}': {}", src, e));
    }

    decode_base64(src)
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("Invalid base64: {}", e))
}

fn truncate(src: &str) -> &str {
    match src.char_indices().nth(32) {
        Some((idx, _)) => &src[..idx],
        None => src,
    }
}

fn probe_image(bytes: &[u8]) -> Result<ImageInfo, String> {
    let unsupported = || "Not a JPEG, PNG or WebP image".to_string();
    let format = image::guess_format(bytes).map_err(|_| unsupported())?;
    let kind = ImageKind::from_format(format).ok_or_else(unsupported)?;

    let (width_px, height_px) = image::io::Reader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| format!("Unreadable image header: {}", e))?;

    Ok(ImageInfo {
        width_px,
        height_px,
        format: kind,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine;

    fn encode(img: &image::DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    /// A solid PNG of the given size, as a data URI.
    pub(crate) fn png_data_uri(width: u32, height: u32) -> String {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([40, 90, 200, 255]),
        ));
        let payload = base64::engine::general_purpose::STANDARD.encode(encode(&img, ImageFormat::Png));
        format!("data:image/png;base64,{}", payload)
    }

    #[test]
    fn data_uri_png_reports_pixel_size() {
        let info = load_image_info(&png_data_uri(7, 5)).unwrap();
        assert_eq!((info.width_px, info.height_px), (7, 5));
        assert_eq!(info.format, ImageKind::Png);
    }

    #[test]
    fn bare_base64_is_accepted() {
        let uri = png_data_uri(2, 9);
        let bare = uri.split_once(',').unwrap().1;
        let info = load_image_info(bare).unwrap();
        assert_eq!((info.width_px, info.height_px), (2, 9));
    }

    #[test]
    fn jpeg_header_is_read_without_decoding() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(12, 4));
        let info = probe_image(&encode(&img, ImageFormat::Jpeg)).unwrap();
        assert_eq!((info.width_px, info.height_px), (12, 4));
        assert_eq!(info.format, ImageKind::Jpeg);
    }

    #[test]
    fn gif_is_not_supported() {
        let err = probe_image(b"GIF89a\x01\x00\x01\x00").unwrap_err();
        assert!(err.contains("JPEG, PNG or WebP"));
    }

    #[test]
    fn data_uri_without_payload_fails() {
        let err = read_source_bytes("data:image/png;base64").unwrap_err();
        assert!(err.starts_with("Data URI has no payload"));
    }

    #[test]
    fn relative_path_is_read_from_disk() {
        assert!(read_source_bytes("./no/such/image.png")
            .unwrap_err()
            .starts_with("Cannot read"));
    }
}
