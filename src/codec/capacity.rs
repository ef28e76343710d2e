//! # Capacity Estimation
//!
//! Upper bound on the payload a carrier can take, per media class:
//!
//! | Class        | Capacity (bytes)               |
//! |--------------|--------------------------------|
//! | Raster image | `width * height * 3 / 8`       |
//! | Audio        | `max(0, file_size - 1024)`     |
//! | Video        | `max(0, file_size - 2048)`     |
//! | Other        | `max(0, file_size - 1024)`     |
//!
//! The raster figure ignores the 8-byte LSB header; the encoder itself applies
//! the stricter check. [`payload_limit`](super::payload_limit) gives the figure
//! a payload is actually checked against.
//!
//! Images too large to decode under [`DECODE_ALLOC_LIMIT`] are rejected here
//! rather than reported with a capacity the encoder cannot use.

use std::io::Cursor;

use image::io::Reader as ImageReader;

use super::error::{Result, StegoError};
use super::lsb::{grid_capacity, DECODE_ALLOC_LIMIT};
use super::media::MediaClass;

/// Pixel dimensions of an encoded image, read from its header only.
pub fn image_dimensions(carrier: &[u8]) -> Result<(u32, u32)> {
    let (width, height) = ImageReader::new(Cursor::new(carrier))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| StegoError::InvalidCarrierFormat(e.to_string()))?;
    check_decodable(width, height)?;
    Ok((width, height))
}

/// Reject dimensions whose 8-bit RGBA buffer exceeds the decode ceiling.
fn check_decodable(width: u32, height: u32) -> Result<()> {
    let bytes = (u64::from(width) * u64::from(height)).saturating_mul(4);
    if bytes > DECODE_ALLOC_LIMIT {
        return Err(StegoError::InvalidCarrierFormat(format!(
            "{}x{} image exceeds the {} byte decode limit",
            width, height, DECODE_ALLOC_LIMIT
        )));
    }
    Ok(())
}

/// Capacity of a carrier that is tail-appended, from its size alone.
pub fn from_file_size(file_size: u64, class: MediaClass) -> u64 {
    file_size.saturating_sub(class.tail_reserve())
}

/// Capacity of a fully materialized carrier.
///
/// Only raster images need their bytes; every other class is sized from the
/// buffer length.
pub fn estimate(carrier: &[u8], class: MediaClass) -> Result<u64> {
    match class {
        MediaClass::RasterImage => {
            let (width, height) = image_dimensions(carrier)?;
            Ok(grid_capacity(width, height))
        }
        _ => Ok(from_file_size(carrier.len() as u64, class)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Vec::new();
        image.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    #[test]
    fn test_decode_ceiling() {
        // 32768 x 32768 RGBA is exactly 4 GiB
        assert!(check_decodable(32768, 32768).is_ok());
        assert!(check_decodable(100, 100).is_ok());
        assert!(matches!(
            check_decodable(32768, 32769),
            Err(StegoError::InvalidCarrierFormat(_))
        ));
        assert!(check_decodable(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_raster_capacity() {
        let png = encoded(
            DynamicImage::ImageRgb8(RgbImage::new(100, 100)),
            ImageFormat::Png,
        );
        assert_eq!(estimate(&png, MediaClass::RasterImage).unwrap(), 3750);

        let bmp = encoded(
            DynamicImage::ImageRgb8(RgbImage::new(7, 3)),
            ImageFormat::Bmp,
        );
        assert_eq!(estimate(&bmp, MediaClass::RasterImage).unwrap(), 7);
    }

    #[test]
    fn test_grayscale_counts_three_channels() {
        let png = encoded(
            DynamicImage::ImageLuma8(GrayImage::new(10, 10)),
            ImageFormat::Png,
        );
        assert_eq!(estimate(&png, MediaClass::RasterImage).unwrap(), 37);
    }

    #[test]
    fn test_size_based_classes() {
        let data = vec![0u8; 5000];
        assert_eq!(estimate(&data, MediaClass::Audio).unwrap(), 3976);
        assert_eq!(estimate(&data, MediaClass::Video).unwrap(), 2952);
        assert_eq!(estimate(&data, MediaClass::Other).unwrap(), 3976);
    }

    #[test]
    fn test_small_files_clamp_to_zero() {
        assert_eq!(from_file_size(1000, MediaClass::Audio), 0);
        assert_eq!(from_file_size(2048, MediaClass::Video), 0);
        assert_eq!(from_file_size(1025, MediaClass::Other), 1);
    }

    #[test]
    fn test_undecodable_image() {
        assert!(matches!(
            estimate(b"not really a png", MediaClass::RasterImage),
            Err(StegoError::InvalidCarrierFormat(_))
        ));
    }
}
