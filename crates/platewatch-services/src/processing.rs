//! Image transcoding for submission photos.

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

/// Transcoded photos fit inside this square; smaller images are never
/// enlarged.
pub const MAX_PHOTO_DIMENSION: u32 = 256;

pub const JPEG_QUALITY: u8 = 80;

/// Decode an uploaded image, downscale it to fit the bounding square
/// while preserving aspect ratio, and re-encode as JPEG.
pub fn transcode_to_jpeg(data: &[u8]) -> Result<Vec<u8>, anyhow::Error> {
    let img = image::load_from_memory(data).context("Failed to decode image")?;

    let (width, height) = img.dimensions();
    let img = if width > MAX_PHOTO_DIMENSION || height > MAX_PHOTO_DIMENSION {
        img.resize(
            MAX_PHOTO_DIMENSION,
            MAX_PHOTO_DIMENSION,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn large_images_are_downscaled_preserving_aspect() {
        let jpeg = transcode_to_jpeg(&png_bytes(1024, 512)).unwrap();
        let result = image::load_from_memory(&jpeg).unwrap();
        let (w, h) = result.dimensions();
        assert_eq!((w, h), (256, 128));
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let jpeg = transcode_to_jpeg(&png_bytes(64, 48)).unwrap();
        let result = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(result.dimensions(), (64, 48));
    }

    #[test]
    fn output_is_jpeg() {
        let jpeg = transcode_to_jpeg(&png_bytes(100, 100)).unwrap();
        let format = image::guess_format(&jpeg).unwrap();
        assert_eq!(format, image::ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_input_fails_to_decode() {
        assert!(transcode_to_jpeg(b"definitely not an image").is_err());
    }
}
