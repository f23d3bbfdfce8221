//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::ImageMetadata;
use super::params::{BitmapTransform, Rotation};

/// Calculate the dimensions that make the longer side equal `max_side`.
///
/// # Arguments
/// * `oriented` - Image dimensions after embedded orientation (width, height)
/// * `max_side` - Target length of the longer side in pixels
///
/// # Returns
/// * `(width, height)` - Scaled dimensions, aspect ratio preserved
///
/// # Examples
/// ```
/// # use image_resizer::imaging::calculate_scaled_dimensions;
/// // 4000x3000 landscape → 1000x750
/// assert_eq!(calculate_scaled_dimensions((4000, 3000), 1000), (1000, 750));
///
/// // 3000x4000 portrait → 750x1000
/// assert_eq!(calculate_scaled_dimensions((3000, 4000), 1000), (750, 1000));
/// ```
pub fn calculate_scaled_dimensions(oriented: (u32, u32), max_side: u32) -> (u32, u32) {
    let (w, h) = oriented;

    if w < h {
        // Portrait: height becomes max_side
        let ratio = max_side as f64 / h as f64;
        (((w as f64 * ratio).round() as u32).max(1), max_side)
    } else {
        // Landscape or square: width becomes max_side
        let ratio = max_side as f64 / w as f64;
        (max_side, ((h as f64 * ratio).round() as u32).max(1))
    }
}

/// What the scale step does with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePlan {
    /// Re-encode unchanged.
    PassThrough,
    /// Resample to exact dimensions.
    Scale {
        width: u32,
        height: u32,
        /// Apply the fixed 270° correction for reoriented sources.
        orientation_correction: bool,
    },
}

impl ScalePlan {
    /// Transform the backend should apply for this plan.
    pub fn transform(self) -> BitmapTransform {
        match self {
            Self::PassThrough => BitmapTransform::new(),
            Self::Scale {
                width,
                height,
                orientation_correction,
            } => {
                let transform = BitmapTransform::new().with_scale(width, height);
                if orientation_correction {
                    transform
                        .with_rotation(Rotation::Clockwise270)
                        .ignoring_orientation()
                } else {
                    transform
                }
            }
        }
    }
}

/// Decide how to scale an image given its decoded metadata.
///
/// With `only_scale_down`, an image whose raw dimensions are both strictly
/// below `max_side` passes through unchanged. Otherwise the longer oriented
/// side becomes `max_side`.
///
/// When both oriented dimensions differ from the raw ones (a quarter-turn
/// EXIF orientation), a 270° clockwise rotation is added to the transform.
pub fn plan_scale(metadata: &ImageMetadata, max_side: u32, only_scale_down: bool) -> ScalePlan {
    if only_scale_down && metadata.pixel_width < max_side && metadata.pixel_height < max_side {
        return ScalePlan::PassThrough;
    }

    let (width, height) = calculate_scaled_dimensions(
        (
            metadata.oriented_pixel_width,
            metadata.oriented_pixel_height,
        ),
        max_side,
    );

    ScalePlan::Scale {
        width,
        height,
        orientation_correction: metadata.is_reoriented(),
    }
}
