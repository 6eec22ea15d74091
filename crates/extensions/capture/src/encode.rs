//! Frame encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use gesturecall_protocols::{CaptureError, FrameData};

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Resize to exactly `width` x `height`. No-op when already that size.
pub fn fit_to(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Triangle)
}

/// Encode as a `data:image/jpeg;base64,...` frame.
pub fn encode_data_url(image: &RgbImage, quality: u8) -> Result<FrameData, CaptureError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .encode_image(&DynamicImage::ImageRgb8(image.clone()))
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;

    let data_url = format!("{}{}", FrameData::JPEG_PREFIX, STANDARD.encode(&buf));
    Ok(FrameData::new(data_url, image.width(), image.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_encode_data_url() {
        let image = RgbImage::from_pixel(32, 24, Rgb([200, 40, 40]));
        let frame = encode_data_url(&image, DEFAULT_JPEG_QUALITY).unwrap();

        assert!(frame.data_url.starts_with(FrameData::JPEG_PREFIX));
        assert_eq!((frame.width, frame.height), (32, 24));

        let bytes = STANDARD.decode(frame.payload()).unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_fit_to_resizes() {
        let image = RgbImage::new(640, 480);
        let fitted = fit_to(image, 180, 120);
        assert_eq!(fitted.dimensions(), (180, 120));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let image = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]));
        let high = encode_data_url(&image, 95).unwrap();
        let low = encode_data_url(&image, 10).unwrap();
        assert!(low.data_url.len() < high.data_url.len());
    }
}
