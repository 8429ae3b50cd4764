use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose},
};
use image::{
    DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, RgbImage, RgbaImage,
    codecs::png::PngEncoder,
};
use tracing::debug;

use super::ImagingError;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Standard alphabet that tolerates missing trailing padding, which browsers
/// and hand-written clients both produce.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded 8-bit image. Channel order is always R, G, B(, A).
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Gray(GrayImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

/// How much of the stored layout `decode` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Always three colour channels; alpha is discarded.
    Color,
    /// Gray stays gray, alpha is kept.
    Unchanged,
}

impl PixelBuffer {
    pub fn channels(&self) -> u8 {
        match self {
            PixelBuffer::Gray(_) => 1,
            PixelBuffer::Rgb(_) => 3,
            PixelBuffer::Rgba(_) => 4,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelBuffer::Gray(img) => img.dimensions(),
            PixelBuffer::Rgb(img) => img.dimensions(),
            PixelBuffer::Rgba(img) => img.dimensions(),
        }
    }

    /// Collapse to three colour channels, expanding gray and dropping alpha.
    pub fn into_rgb(self) -> RgbImage {
        match self {
            PixelBuffer::Gray(img) => DynamicImage::ImageLuma8(img).to_rgb8(),
            PixelBuffer::Rgb(img) => img,
            PixelBuffer::Rgba(img) => DynamicImage::ImageRgba8(img).to_rgb8(),
        }
    }
}

impl From<GrayImage> for PixelBuffer {
    fn from(img: GrayImage) -> Self {
        PixelBuffer::Gray(img)
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(img: RgbImage) -> Self {
        PixelBuffer::Rgb(img)
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        PixelBuffer::Rgba(img)
    }
}

/// Decode any format `image` can sniff from the byte stream.
pub fn decode(bytes: &[u8], mode: DecodeMode) -> Result<PixelBuffer, ImagingError> {
    if bytes.is_empty() {
        return Err(ImagingError::InvalidImage("empty payload".to_string()));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| ImagingError::InvalidImage(e.to_string()))?;
    let color = image.color();
    debug!(
        "Decoded {}x{} image, color type {:?}",
        image.width(),
        image.height(),
        color
    );

    let buffer = match mode {
        DecodeMode::Color => PixelBuffer::Rgb(image.to_rgb8()),
        DecodeMode::Unchanged if color.has_alpha() => PixelBuffer::Rgba(image.to_rgba8()),
        DecodeMode::Unchanged if !color.has_color() => PixelBuffer::Gray(image.to_luma8()),
        DecodeMode::Unchanged => PixelBuffer::Rgb(image.to_rgb8()),
    };

    Ok(buffer)
}

/// Encode as PNG, whatever the source format was.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, ImagingError> {
    let (width, height) = buffer.dimensions();
    let (raw, color_type) = match buffer {
        PixelBuffer::Gray(img) => (img.as_raw(), ExtendedColorType::L8),
        PixelBuffer::Rgb(img) => (img.as_raw(), ExtendedColorType::Rgb8),
        PixelBuffer::Rgba(img) => (img.as_raw(), ExtendedColorType::Rgba8),
    };

    let mut png_data = Vec::new();
    let encoder = PngEncoder::new(&mut png_data);
    encoder
        .write_image(raw, width, height, color_type)
        .map_err(ImagingError::Encode)?;

    Ok(png_data)
}

pub fn to_data_uri(png_bytes: &[u8]) -> String {
    format!(
        "{}{}",
        PNG_DATA_URI_PREFIX,
        general_purpose::STANDARD.encode(png_bytes)
    )
}

/// Accept either a full data URI or a bare base64 string.
pub fn decode_data_uri_or_raw(payload: &str) -> Result<Vec<u8>, ImagingError> {
    let encoded = payload
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(payload);

    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    Ok(LENIENT_BASE64.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Luma, Rgb, Rgba};
    use std::io::Cursor;

    fn encode_as(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn gradient_rgba() -> RgbaImage {
        RgbaImage::from_fn(16, 8, |x, y| {
            Rgba([(x * 16) as u8, (y * 32) as u8, 200, (x * 8 + y) as u8])
        })
    }

    #[test]
    fn test_empty_and_garbage_bytes_are_invalid_images() {
        assert!(matches!(
            decode(&[], DecodeMode::Color),
            Err(ImagingError::InvalidImage(_))
        ));
        assert!(matches!(
            decode(b"definitely not an image", DecodeMode::Unchanged),
            Err(ImagingError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let sources = vec![
            DynamicImage::ImageRgba8(gradient_rgba()),
            DynamicImage::ImageRgb8(RgbImage::from_fn(9, 5, |x, y| {
                Rgb([x as u8 * 20, y as u8 * 40, 7])
            })),
            DynamicImage::ImageLuma8(GrayImage::from_fn(4, 4, |x, y| Luma([(x * y * 10) as u8]))),
        ];

        for source in sources {
            let png = encode_as(source, ImageFormat::Png);
            let decoded = decode(&png, DecodeMode::Unchanged).unwrap();
            let reencoded = encode_png(&decoded).unwrap();
            let redecoded = decode(&reencoded, DecodeMode::Unchanged).unwrap();
            assert_eq!(decoded, redecoded);
        }
    }

    #[test]
    fn test_unchanged_keeps_layout() {
        let rgba = encode_as(DynamicImage::ImageRgba8(gradient_rgba()), ImageFormat::Png);
        assert_eq!(decode(&rgba, DecodeMode::Unchanged).unwrap().channels(), 4);

        let gray = encode_as(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([9]))),
            ImageFormat::Png,
        );
        assert_eq!(decode(&gray, DecodeMode::Unchanged).unwrap().channels(), 1);
    }

    #[test]
    fn test_color_mode_drops_alpha() {
        let png = encode_as(DynamicImage::ImageRgba8(gradient_rgba()), ImageFormat::Png);
        let decoded = decode(&png, DecodeMode::Color).unwrap();
        assert_eq!(decoded.channels(), 3);
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn test_jpeg_input_is_reencoded_as_png() {
        let jpeg = encode_as(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([120, 60, 30]))),
            ImageFormat::Jpeg,
        );
        let decoded = decode(&jpeg, DecodeMode::Color).unwrap();
        let png = encode_png(&decoded).unwrap();

        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let reloaded = image::load_from_memory(&png).unwrap();
        assert_eq!(reloaded.dimensions(), (10, 10));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let png = encode_png(&PixelBuffer::Rgb(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]))))
            .unwrap();
        let uri = to_data_uri(&png);

        assert!(uri.starts_with(PNG_DATA_URI_PREFIX));
        assert_eq!(decode_data_uri_or_raw(&uri).unwrap(), png);

        let raw = uri.trim_start_matches(PNG_DATA_URI_PREFIX);
        assert_eq!(decode_data_uri_or_raw(raw).unwrap(), png);
    }

    #[test]
    fn test_base64_tolerates_whitespace_and_missing_padding() {
        assert_eq!(decode_data_uri_or_raw("aGk=").unwrap(), b"hi");
        assert_eq!(decode_data_uri_or_raw("aGk").unwrap(), b"hi");
        assert_eq!(decode_data_uri_or_raw("aG\nk=").unwrap(), b"hi");
        assert_eq!(
            decode_data_uri_or_raw("data:image/jpeg;base64,aGk=").unwrap(),
            b"hi"
        );
    }

    #[test]
    fn test_malformed_base64_is_rejected() {
        assert!(matches!(
            decode_data_uri_or_raw("data:image/png;base64,@@@@"),
            Err(ImagingError::InvalidBase64(_))
        ));
        assert!(decode_data_uri_or_raw("not*base64").is_err());
    }

    #[test]
    fn test_into_rgb_collapses_channels() {
        let gray = PixelBuffer::Gray(GrayImage::from_pixel(1, 1, Luma([50])));
        assert_eq!(gray.into_rgb().get_pixel(0, 0), &Rgb([50, 50, 50]));

        let rgba = PixelBuffer::Rgba(RgbaImage::from_pixel(1, 1, Rgba([5, 6, 7, 0])));
        assert_eq!(rgba.into_rgb().get_pixel(0, 0), &Rgb([5, 6, 7]));
    }
}
