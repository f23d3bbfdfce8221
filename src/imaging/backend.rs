//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the capability interface the resize pipeline
//! talks to: decode (header metadata), transcode (decode + transform +
//! re-encode in the source format), and JPEG encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) built on the `image`
//! crate. Tests use `tests::MockBackend`, which records
//! calls and replays queued metadata.

use super::params::{BitmapTransform, JpegQuality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Layout of a decoded pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    Gray8,
    GrayAlpha8,
    #[default]
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
    Unknown,
}

impl PixelFormat {
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::GrayAlpha8 | Self::Rgba8 | Self::GrayAlpha16 | Self::Rgba16 | Self::Rgba32F
        )
    }
}

impl From<image::ColorType> for PixelFormat {
    fn from(color: image::ColorType) -> Self {
        use image::ColorType;
        match color {
            ColorType::L8 => Self::Gray8,
            ColorType::La8 => Self::GrayAlpha8,
            ColorType::Rgb8 => Self::Rgb8,
            ColorType::Rgba8 => Self::Rgba8,
            ColorType::L16 => Self::Gray16,
            ColorType::La16 => Self::GrayAlpha16,
            ColorType::Rgb16 => Self::Rgb16,
            ColorType::Rgba16 => Self::Rgba16,
            ColorType::Rgb32F => Self::Rgb32F,
            ColorType::Rgba32F => Self::Rgba32F,
            _ => Self::Unknown,
        }
    }
}

/// How the alpha channel of a pixel buffer is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    Straight,
    #[default]
    Ignore,
}

impl From<PixelFormat> for AlphaMode {
    fn from(format: PixelFormat) -> Self {
        if format.has_alpha() {
            Self::Straight
        } else {
            Self::Ignore
        }
    }
}

/// Metadata read from an encoded image without decoding its pixels.
///
/// `pixel_*` is the stored pixel grid; `oriented_pixel_*` is the grid after
/// applying the embedded (EXIF) orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMetadata {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub oriented_pixel_width: u32,
    pub oriented_pixel_height: u32,
    pub pixel_format: PixelFormat,
    pub alpha_mode: AlphaMode,
    pub dpi_x: f64,
    pub dpi_y: f64,
}

impl ImageMetadata {
    /// Metadata for an untagged image of the given size at 96 DPI.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixel_width: width,
            pixel_height: height,
            oriented_pixel_width: width,
            oriented_pixel_height: height,
            ..Self::default()
        }
    }

    /// Same image, tagged with a quarter-turn orientation.
    pub fn with_quarter_turn(mut self) -> Self {
        self.oriented_pixel_width = self.pixel_height;
        self.oriented_pixel_height = self.pixel_width;
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixel_width,
            height: self.pixel_height,
        }
    }

    pub fn oriented_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.oriented_pixel_width,
            height: self.oriented_pixel_height,
        }
    }

    /// Both oriented dimensions differ from the stored ones.
    pub fn is_reoriented(&self) -> bool {
        self.oriented_pixel_width != self.pixel_width
            && self.oriented_pixel_height != self.pixel_height
    }
}

impl Default for ImageMetadata {
    fn default() -> Self {
        Self {
            pixel_width: 0,
            pixel_height: 0,
            oriented_pixel_width: 0,
            oriented_pixel_height: 0,
            pixel_format: PixelFormat::default(),
            alpha_mode: AlphaMode::default(),
            dpi_x: super::density::DEFAULT_DPI,
            dpi_y: super::density::DEFAULT_DPI,
        }
    }
}

/// Trait for image processing backends.
///
/// All methods take the complete encoded image as bytes; streams are handled
/// by [`operations`](super::operations). Methods are blocking and are run on
/// the blocking thread pool by the async operations.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions, orientation, pixel format and DPI.
    fn decode(&self, bytes: &[u8]) -> Result<ImageMetadata, BackendError>;

    /// Apply a geometric transform and re-encode in the source format.
    fn transcode(&self, bytes: &[u8], transform: &BitmapTransform)
    -> Result<Vec<u8>, BackendError>;

    /// Decode the full pixel buffer and encode it as JPEG.
    fn encode_jpeg(&self, bytes: &[u8], quality: JpegQuality) -> Result<Vec<u8>, BackendError>;
}
