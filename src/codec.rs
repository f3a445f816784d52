//! Output formats and their encoders.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage};
use std::io::Cursor;
use std::path::Path;

use crate::error::CompressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Map a lowercased extension token to its output format.
    pub fn from_extension(token: &str) -> Option<Self> {
        match token {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Encode `image` at `quality` (0-100).
    ///
    /// JPEG drops any alpha channel. PNG is lossless and ignores the quality.
    /// WebP is always lossy.
    pub fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
        match self {
            Self::Jpeg => encode_jpeg(image, quality),
            Self::Png => encode_png(image),
            Self::WebP => encode_webp_lossy(image, quality),
        }
    }
}

/// Lowercased text after the last `.` of the file name, or empty.
pub fn extension_token(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        .unwrap_or_default()
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgb_image = image.to_rgb8();
    let (width, height) = rgb_image.dimensions();

    let mut result_data = Vec::new();
    let mut cursor = Cursor::new(&mut result_data);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.max(1));
    encoder
        .encode(&rgb_image, width, height, ColorType::Rgb8)
        .map_err(|e| CompressError::Encode(e.to_string()))?;

    Ok(result_data)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CompressError> {
    let mut result_data = Vec::new();
    let mut cursor = Cursor::new(&mut result_data);

    let encoder = PngEncoder::new_with_quality(
        &mut cursor,
        CompressionType::Default,
        FilterType::Adaptive,
    );
    image
        .write_with_encoder(encoder)
        .map_err(|e| CompressError::Encode(e.to_string()))?;

    Ok(result_data)
}

fn encode_webp_lossy(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let rgba_image = image.to_rgba8();
    let (width, height) = rgba_image.dimensions();

    let encoder = webp::Encoder::from_rgba(&rgba_image, width, height);
    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| CompressError::Encode(format!("WebP encoder rejected image: {:?}", e)))?;

    Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        let mut img = RgbaImage::new(16, 12);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 16) as u8, (y * 20) as u8, 128, 200]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(OutputFormat::from_extension("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_extension("bmp"), None);
        assert_eq!(OutputFormat::from_extension(""), None);
    }

    #[test]
    fn test_extension_token() {
        assert_eq!(extension_token(Path::new("/a/b/Photo.JPG")), "jpg");
        assert_eq!(extension_token(Path::new("/a/b/archive.tar.webp")), "webp");
        assert_eq!(extension_token(Path::new("/a/b.d/noext")), "");
        assert_eq!(extension_token(Path::new("/a/b/trailing.")), "");
    }

    #[test]
    fn test_jpeg_output_signature() {
        let data = OutputFormat::Jpeg.encode(&sample(), 80).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_quality_zero_is_accepted() {
        assert!(OutputFormat::Jpeg.encode(&sample(), 0).is_ok());
    }

    #[test]
    fn test_png_output_signature() {
        let data = OutputFormat::Png.encode(&sample(), 10).unwrap();
        assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.to_rgba8(), sample().to_rgba8());
    }

    #[test]
    fn test_webp_is_lossy() {
        let data = OutputFormat::WebP.encode(&sample(), 80).unwrap();
        assert_eq!(&data[..4], b"RIFF");
        assert_eq!(&data[8..12], b"WEBP");
        // Lossy bitstreams carry a VP8 chunk; lossless ones use VP8L.
        assert!(data.windows(4).any(|w| w == b"VP8 "));
        assert!(!data.windows(4).any(|w| w == b"VP8L"));
    }

    #[test]
    fn test_webp_over_max_dimension_is_an_error() {
        // WebP caps each side at 16383 pixels.
        let wide = DynamicImage::ImageRgb8(image::RgbImage::new(17_000, 1));
        let err = OutputFormat::WebP.encode(&wide, 80).unwrap_err();
        assert!(matches!(err, CompressError::Encode(_)));
    }
}
