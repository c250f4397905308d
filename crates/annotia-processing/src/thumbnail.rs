//! Thumbnail encoding
//!
//! Downsizes a rendered image to fit the requested envelope (aspect ratio
//! preserved, never upscaled) and encodes it as a progressive JPEG at
//! quality 80 regardless of the source format, to keep dataset pages fast.

use annotia_storage::ThumbnailSize;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

const THUMBNAIL_JPEG_QUALITY: f32 = 80.0;

/// Encode a thumbnail of `image` fitting within `size`.
pub fn thumbnail_jpeg(image: DynamicImage, size: ThumbnailSize) -> anyhow::Result<Bytes> {
    let (width, height) = image.dimensions();

    // `thumbnail` scales to fill the bounds; guard so small images are
    // never upscaled.
    let resized = if width > size.width || height > size.height {
        image.thumbnail(size.width, size.height)
    } else {
        image
    };

    let rgb = resized.to_rgb8();
    let (out_width, out_height) = rgb.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(out_width as usize, out_height as usize);
    comp.set_quality(THUMBNAIL_JPEG_QUALITY);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(&rgb)?;
    let jpeg_data = comp.finish()?;

    Ok(Bytes::from(jpeg_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, ImageReader, Rgba, RgbaImage};
    use std::io::Cursor;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([40, 90, 200, 255]),
        ))
    }

    fn decode(data: &[u8]) -> DynamicImage {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn fits_envelope_preserving_aspect_ratio() {
        let jpeg = thumbnail_jpeg(test_image(200, 100), ThumbnailSize::new(64, 64)).unwrap();
        let decoded = decode(&jpeg);
        assert_eq!(decoded.dimensions(), (64, 32));
    }

    #[test]
    fn never_upscales_small_images() {
        let jpeg = thumbnail_jpeg(test_image(20, 10), ThumbnailSize::new(512, 512)).unwrap();
        let decoded = decode(&jpeg);
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn output_is_jpeg_whatever_the_source() {
        let jpeg = thumbnail_jpeg(test_image(50, 50), ThumbnailSize::default()).unwrap();
        let format = ImageReader::new(Cursor::new(jpeg.as_ref()))
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn regeneration_is_deterministic() {
        let size = ThumbnailSize::new(96, 96);
        let a = thumbnail_jpeg(test_image(300, 200), size).unwrap();
        let b = thumbnail_jpeg(test_image(300, 200), size).unwrap();
        // Identical input, size, and quality settings produce identical output.
        assert_eq!(a, b);
        assert_eq!(decode(&a).dimensions(), decode(&b).dimensions());
    }
}
