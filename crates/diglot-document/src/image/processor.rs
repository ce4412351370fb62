// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode with orientation correction, bounded downscale,
// and re-encode. Operates on in-memory images using the `image` crate.

use std::io::Cursor;

use diglot_core::config::{ImageSettings, TargetImageFormat};
use diglot_core::error::DiglotError;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let bytes = ImageProcessor::from_bytes(&raw)?
///     .fit_width(800)
///     .encode(TargetImageFormat::Jpeg, 85)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...) and apply any stored
    /// orientation metadata so the pixels match the intended display.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DiglotError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| DiglotError::ImageNormalization(format!("unreadable image: {}", err)))?;

        let mut decoder = reader.into_decoder().map_err(|err| {
            DiglotError::ImageNormalization(format!("failed to decode image: {}", err))
        })?;
        let orientation = decoder.orientation().map_err(|err| {
            DiglotError::ImageNormalization(format!("bad orientation metadata: {}", err))
        })?;

        let mut img = DynamicImage::from_decoder(decoder).map_err(|err| {
            DiglotError::ImageNormalization(format!("failed to decode image: {}", err))
        })?;
        img.apply_orientation(orientation);

        debug!(
            width = img.width(),
            height = img.height(),
            ?orientation,
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Scale the image down so its width is at most `max_width`, preserving
    /// aspect ratio. New height is `round(height * max_width / width)`.
    /// Narrower images are returned untouched; this never upscales. A
    /// `max_width` of 0 means no bound.
    /// Uses Lanczos3 filtering for high-quality downscaling.
    #[instrument(skip(self), fields(max_width))]
    pub fn fit_width(self, max_width: u32) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        if max_width == 0 || width <= max_width {
            return self;
        }

        let (new_w, new_h) = scaled_dimensions(width, height, max_width);
        info!(
            from_w = width,
            from_h = height,
            new_w,
            new_h,
            "Resizing image"
        );
        let resized =
            self.image
                .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image in `format`. `quality` (1-100) is honoured by
    /// JPEG; PNG and WebP are lossless.
    pub fn encode(&self, format: TargetImageFormat, quality: u8) -> Result<Vec<u8>, DiglotError> {
        match format {
            TargetImageFormat::Jpeg => self.to_jpeg_bytes(quality),
            TargetImageFormat::Png => encode_to_format(&self.image, ImageFormat::Png),
            // The WebP encoder only accepts 8-bit RGB(A).
            TargetImageFormat::Webp => encode_to_format(
                &DynamicImage::ImageRgba8(self.image.to_rgba8()),
                ImageFormat::WebP,
            ),
        }
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, DiglotError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            DiglotError::ImageNormalization(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(buffer)
    }
}

/// Run the full normalization pipeline on one encoded image: decode, fix
/// orientation, bound the width, re-encode.
#[instrument(skip_all, fields(data_len = raw.len(), max_width = settings.max_width))]
pub fn normalize(raw: &[u8], settings: &ImageSettings) -> Result<Vec<u8>, DiglotError> {
    ImageProcessor::from_bytes(raw)?
        .fit_width(settings.max_width)
        .encode(settings.format, settings.quality)
}

/// Target dimensions for fitting `width` x `height` into `max_width`.
fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
    (max_width, (scaled as u32).max(1))
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DiglotError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        DiglotError::ImageNormalization(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_of(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        encode_to_format(&DynamicImage::ImageRgb8(img), ImageFormat::Png).unwrap()
    }

    fn settings(max_width: u32, format: TargetImageFormat) -> ImageSettings {
        ImageSettings {
            enable: true,
            max_width,
            format,
            quality: 80,
        }
    }

    #[test]
    fn wide_image_is_scaled_to_max_width() {
        let out = normalize(&png_of(1200, 800), &settings(600, TargetImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (600, 400));
    }

    #[test]
    fn narrow_image_is_never_upscaled() {
        let out = normalize(&png_of(300, 500), &settings(600, TargetImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 500));
    }

    #[test]
    fn zero_max_width_leaves_size_unbounded() {
        let out = normalize(&png_of(1200, 800), &settings(0, TargetImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 800));
    }

    /// JPEG of `width` x `height` carrying an EXIF Orientation tag.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 200])));
        let jpeg = ImageProcessor { image: img }.to_jpeg_bytes(90).unwrap();

        // Big-endian TIFF header, one IFD entry: 0x0112 Orientation, SHORT.
        let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01];
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = u16::try_from(payload.len() + 2).unwrap();

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn stored_orientation_is_applied_before_scaling() {
        let raw = jpeg_with_orientation(40, 20, 6);
        let out = normalize(&raw, &settings(800, TargetImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 40));

        let out = normalize(&raw, &settings(10, TargetImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 20));
    }

    #[test]
    fn aspect_ratio_is_kept_within_a_pixel() {
        for (w, h, max) in [(1001, 333, 250), (4000, 3001, 799), (1919, 1080, 640)] {
            let (new_w, new_h) = scaled_dimensions(w, h, max);
            assert!(new_w <= max);
            let expected = f64::from(h) * f64::from(new_w) / f64::from(w);
            assert!((f64::from(new_h) - expected).abs() <= 1.0, "{w}x{h} -> {new_w}x{new_h}");
        }
    }

    #[test]
    fn output_uses_target_format() {
        let jpeg = normalize(&png_of(64, 32), &settings(800, TargetImageFormat::Jpeg)).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);

        let webp = normalize(&png_of(64, 32), &settings(800, TargetImageFormat::Webp)).unwrap();
        assert_eq!(image::guess_format(&webp).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn garbage_bytes_fail_without_panicking() {
        let err = normalize(b"not an image", &settings(600, TargetImageFormat::Png)).unwrap_err();
        assert!(matches!(err, DiglotError::ImageNormalization(_)));
    }
}
