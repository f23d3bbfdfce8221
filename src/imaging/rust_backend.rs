//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | EXIF orientation | `ImageDecoder::orientation` |
//! | Pixel density | custom [`density`](super::density) reader (JFIF APP0, PNG pHYs) |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Scale | `DynamicImage::resize_exact` (`Fant` → Lanczos3) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! ## Transcode semantics
//!
//! Transcoding bakes the embedded orientation into the pixels, then rotates,
//! then scales. A transform marked `ignore_orientation` skips the first step
//! and works on the stored grid. The result is re-encoded in the source
//! format (JPEG stays JPEG at quality 95, PNG and TIFF stay as they are,
//! anything else becomes PNG). No orientation tag is written, so transcoded
//! output is always displayed as stored.

use super::backend::{AlphaMode, BackendError, ImageBackend, ImageMetadata, PixelFormat};
use super::density::{density_or_default, read_density};
use super::params::{BitmapTransform, Interpolation, JpegQuality, Rotation};
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Quality used for JPEG intermediates between pipeline steps.
const INTERMEDIATE_JPEG_QUALITY: u8 = 95;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_for(interpolation: Interpolation) -> FilterType {
    match interpolation {
        Interpolation::NearestNeighbor => FilterType::Nearest,
        Interpolation::Linear => FilterType::Triangle,
        Interpolation::Cubic => FilterType::CatmullRom,
        Interpolation::Fant => FilterType::Lanczos3,
    }
}

/// Orientations that contain a quarter turn and therefore swap width/height.
fn swaps_dimensions(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(BackendError::ProcessingFailed(
            "Unrecognized image format".into(),
        ));
    }
    Ok(reader)
}

/// A fully decoded image with the facts needed to re-encode it.
struct Loaded {
    image: DynamicImage,
    format: ImageFormat,
    orientation: Orientation,
}

/// Decode the full pixel buffer without applying orientation.
fn load_image(bytes: &[u8]) -> Result<Loaded, BackendError> {
    let reader = reader(bytes)?;
    let format = reader
        .format()
        .ok_or_else(|| BackendError::ProcessingFailed("Unrecognized image format".into()))?;
    let mut decoder = reader.into_decoder().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to create {format:?} decoder: {e}"))
    })?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let image = DynamicImage::from_decoder(decoder).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {format:?} image: {e}"))
    })?;
    Ok(Loaded {
        image,
        format,
        orientation,
    })
}

fn density_value(dpi: f64) -> u16 {
    dpi.round().clamp(1.0, u16::MAX as f64) as u16
}

/// Encode as baseline JPEG. Alpha is dropped; density is written as DPI.
fn write_jpeg(
    image: &DynamicImage,
    quality: u8,
    density: Option<(f64, f64)>,
) -> Result<Vec<u8>, BackendError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    if let Some((dpi_x, dpi_y)) = density {
        encoder.set_pixel_density(PixelDensity {
            density: (density_value(dpi_x), density_value(dpi_y)),
            unit: PixelDensityUnit::Inches,
        });
    }
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

/// Re-encode in the container the image came from.
fn write_like_source(
    image: &DynamicImage,
    format: ImageFormat,
    density: Option<(f64, f64)>,
) -> Result<Vec<u8>, BackendError> {
    let target = match format {
        ImageFormat::Jpeg => return write_jpeg(image, INTERMEDIATE_JPEG_QUALITY, density),
        ImageFormat::Png | ImageFormat::Tiff => format,
        _ => ImageFormat::Png,
    };
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), target)
        .map_err(|e| BackendError::ProcessingFailed(format!("{target:?} encode failed: {e}")))?;
    Ok(out)
}

fn rotate(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => image.rotate90(),
        Rotation::Clockwise180 => image.rotate180(),
        Rotation::Clockwise270 => image.rotate270(),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<ImageMetadata, BackendError> {
        let reader = reader(bytes)?;
        let mut decoder = reader.into_decoder().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read image header: {e}"))
        })?;

        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let (width, height) = decoder.dimensions();
        let pixel_format = PixelFormat::from(decoder.color_type());
        let (oriented_width, oriented_height) = if swaps_dimensions(orientation) {
            (height, width)
        } else {
            (width, height)
        };
        let (dpi_x, dpi_y) = density_or_default(bytes);

        if orientation != Orientation::NoTransforms {
            debug!(?orientation, width, height, "embedded orientation");
        }

        Ok(ImageMetadata {
            pixel_width: width,
            pixel_height: height,
            oriented_pixel_width: oriented_width,
            oriented_pixel_height: oriented_height,
            pixel_format,
            alpha_mode: AlphaMode::from(pixel_format),
            dpi_x,
            dpi_y,
        })
    }

    fn transcode(
        &self,
        bytes: &[u8],
        transform: &BitmapTransform,
    ) -> Result<Vec<u8>, BackendError> {
        let Loaded {
            mut image,
            format,
            orientation,
        } = load_image(bytes)?;
        let density = read_density(bytes);

        if !transform.ignore_orientation {
            image.apply_orientation(orientation);
        }
        let rotated = rotate(image, transform.rotation);
        let current = (rotated.width(), rotated.height());
        let result = match transform.scaled {
            Some(target) if (target.width, target.height) != current => rotated.resize_exact(
                target.width,
                target.height,
                filter_for(transform.interpolation),
            ),
            _ => rotated,
        };

        debug!(
            ?format,
            ?orientation,
            ignore_orientation = transform.ignore_orientation,
            rotation = transform.rotation.degrees(),
            width = result.width(),
            height = result.height(),
            "transcoded"
        );
        write_like_source(&result, format, density)
    }

    fn encode_jpeg(&self, bytes: &[u8], quality: JpegQuality) -> Result<Vec<u8>, BackendError> {
        let density = density_or_default(bytes);
        let Loaded {
            mut image,
            orientation,
            ..
        } = load_image(bytes)?;
        image.apply_orientation(orientation);
        write_jpeg(&image, quality.encoder_quality(), Some(density))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::density::read_density;
    use crate::test_helpers::{
        image_dimensions as dimensions_of, jpeg_bytes, png_bytes, with_exif_orientation,
    };

    // =========================================================================
    // decode
    // =========================================================================

    #[test]
    fn decode_synthetic_jpeg() {
        let meta = RustBackend::new().decode(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!((meta.pixel_width, meta.pixel_height), (200, 150));
        assert_eq!(
            (meta.oriented_pixel_width, meta.oriented_pixel_height),
            (200, 150)
        );
        assert_eq!(meta.pixel_format, PixelFormat::Rgb8);
        assert_eq!(meta.alpha_mode, AlphaMode::Ignore);
        assert!(!meta.is_reoriented());
    }

    #[test]
    fn decode_png_with_alpha() {
        let meta = RustBackend::new().decode(&png_bytes(20, 10)).unwrap();
        assert_eq!((meta.pixel_width, meta.pixel_height), (20, 10));
        assert_eq!(meta.pixel_format, PixelFormat::Rgba8);
        assert_eq!(meta.alpha_mode, AlphaMode::Straight);
        assert_eq!((meta.dpi_x, meta.dpi_y), (96.0, 96.0));
    }

    #[test]
    fn decode_reads_exif_quarter_turn() {
        let bytes = with_exif_orientation(&jpeg_bytes(40, 30), 6);
        let meta = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!((meta.pixel_width, meta.pixel_height), (40, 30));
        assert_eq!(
            (meta.oriented_pixel_width, meta.oriented_pixel_height),
            (30, 40)
        );
        assert!(meta.is_reoriented());
    }

    #[test]
    fn decode_exif_half_turn_keeps_dimensions() {
        let bytes = with_exif_orientation(&jpeg_bytes(40, 30), 3);
        let meta = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!(
            (meta.oriented_pixel_width, meta.oriented_pixel_height),
            (40, 30)
        );
    }

    #[test]
    fn decode_garbage_errors() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(result.is_err());
    }

    // =========================================================================
    // transcode
    // =========================================================================

    #[test]
    fn transcode_identity_keeps_size_and_format() {
        let backend = RustBackend::new();
        let out = backend
            .transcode(&jpeg_bytes(64, 48), &BitmapTransform::new())
            .unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        assert_eq!(dimensions_of(&out), (64, 48));
    }

    #[test]
    fn transcode_scales_to_exact_dimensions() {
        let backend = RustBackend::new();
        let out = backend
            .transcode(
                &jpeg_bytes(400, 300),
                &BitmapTransform::new().with_scale(100, 75),
            )
            .unwrap();
        assert_eq!(dimensions_of(&out), (100, 75));
    }

    #[test]
    fn transcode_rotates_clockwise() {
        let backend = RustBackend::new();
        let transform = BitmapTransform::new().with_rotation(Rotation::Clockwise90);
        let out = backend.transcode(&jpeg_bytes(64, 48), &transform).unwrap();
        assert_eq!(dimensions_of(&out), (48, 64));

        let transform = BitmapTransform::new().with_rotation(Rotation::Clockwise180);
        let out = backend.transcode(&jpeg_bytes(64, 48), &transform).unwrap();
        assert_eq!(dimensions_of(&out), (64, 48));
    }

    #[test]
    fn transcode_rotates_before_scaling() {
        // 40x30 rotated 270° → 30x40, then scaled to 15x20 without distortion
        let backend = RustBackend::new();
        let transform = BitmapTransform::new()
            .with_rotation(Rotation::Clockwise270)
            .with_scale(15, 20);
        let out = backend.transcode(&jpeg_bytes(40, 30), &transform).unwrap();
        assert_eq!(dimensions_of(&out), (15, 20));
    }

    #[test]
    fn transcode_png_stays_png() {
        let backend = RustBackend::new();
        let out = backend
            .transcode(&png_bytes(20, 10), &BitmapTransform::new().with_scale(10, 5))
            .unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        assert_eq!(dimensions_of(&out), (10, 5));
    }

    #[test]
    fn transcode_bakes_in_orientation() {
        let backend = RustBackend::new();
        let tagged = with_exif_orientation(&jpeg_bytes(40, 30), 6);
        let out = backend.transcode(&tagged, &BitmapTransform::new()).unwrap();
        let meta = backend.decode(&out).unwrap();
        assert!(!meta.is_reoriented());
        assert_eq!((meta.pixel_width, meta.pixel_height), (30, 40));
    }

    #[test]
    fn transcode_scale_is_in_oriented_frame() {
        let backend = RustBackend::new();
        let tagged = with_exif_orientation(&jpeg_bytes(40, 30), 6);
        let out = backend
            .transcode(&tagged, &BitmapTransform::new().with_scale(15, 20))
            .unwrap();
        assert_eq!(dimensions_of(&out), (15, 20));
    }

    #[test]
    fn transcode_ignoring_orientation_uses_stored_grid() {
        let backend = RustBackend::new();
        let tagged = with_exif_orientation(&jpeg_bytes(40, 30), 6);
        let out = backend
            .transcode(&tagged, &BitmapTransform::new().ignoring_orientation())
            .unwrap();
        let meta = backend.decode(&out).unwrap();
        assert!(!meta.is_reoriented());
        assert_eq!((meta.pixel_width, meta.pixel_height), (40, 30));
    }

    // =========================================================================
    // encode_jpeg
    // =========================================================================

    #[test]
    fn encode_jpeg_from_png_drops_alpha() {
        let backend = RustBackend::new();
        let out = backend
            .encode_jpeg(&png_bytes(20, 10), JpegQuality::from_percent(80))
            .unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let meta = backend.decode(&out).unwrap();
        assert_eq!((meta.pixel_width, meta.pixel_height), (20, 10));
        assert_eq!(meta.alpha_mode, AlphaMode::Ignore);
    }

    #[test]
    fn encode_jpeg_lower_quality_is_smaller() {
        let backend = RustBackend::new();
        let source = jpeg_bytes(128, 128);
        let high = backend
            .encode_jpeg(&source, JpegQuality::from_percent(100))
            .unwrap();
        let low = backend
            .encode_jpeg(&source, JpegQuality::from_percent(10))
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn encode_jpeg_carries_density() {
        let backend = RustBackend::new();
        let source = write_jpeg(
            &DynamicImage::new_rgb8(16, 16),
            90,
            Some((300.0, 300.0)),
        )
        .unwrap();
        let out = backend
            .encode_jpeg(&source, JpegQuality::default())
            .unwrap();
        assert_eq!(read_density(&out), Some((300.0, 300.0)));
    }

    #[test]
    fn encode_jpeg_applies_orientation() {
        let backend = RustBackend::new();
        let tagged = with_exif_orientation(&jpeg_bytes(40, 30), 6);
        let out = backend
            .encode_jpeg(&tagged, JpegQuality::default())
            .unwrap();
        assert_eq!(dimensions_of(&out), (30, 40));
    }
}
