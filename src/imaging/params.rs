//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which transform a step needs) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`Rotation`] — One of the four fixed clockwise rotations.
//! - [`Interpolation`] — Resampling filter requested for a transform.
//! - [`BitmapTransform`] — Rotation + optional scale + interpolation for a transcode.
//! - [`JpegQuality`] — JPEG quality factor (0.0–1.0) derived from a 0–100 percentage.

use super::backend::Dimensions;

/// Fixed clockwise rotations supported by the transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Map a requested angle in degrees to a rotation.
    ///
    /// Only 90, 180 and 270 rotate; every other value (including negative
    /// angles and 360) is treated as no rotation.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            90 => Self::Clockwise90,
            180 => Self::Clockwise180,
            270 => Self::Clockwise270,
            _ => Self::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Clockwise180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Whether this rotation swaps width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Clockwise90 | Self::Clockwise270)
    }
}

/// Resampling filter for scaling.
///
/// `Fant` is the high-quality filter every pipeline step asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    NearestNeighbor,
    Linear,
    Cubic,
    #[default]
    Fant,
}

/// Geometric transform applied while transcoding.
///
/// The embedded orientation is applied first (unless `ignore_orientation`
/// is set), then rotation, then scaling; `scaled` is expressed in the final
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapTransform {
    pub scaled: Option<Dimensions>,
    pub rotation: Rotation,
    pub interpolation: Interpolation,
    /// Work on the stored pixel grid; `rotation` stands in for the tag.
    pub ignore_orientation: bool,
}

impl BitmapTransform {
    /// Identity transform with high-quality interpolation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, width: u32, height: u32) -> Self {
        self.scaled = Some(Dimensions { width, height });
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn ignoring_orientation(mut self) -> Self {
        self.ignore_orientation = true;
        self
    }

    /// No rotation or scale requested. The embedded orientation may still apply.
    pub fn is_identity(&self) -> bool {
        self.scaled.is_none() && self.rotation == Rotation::None
    }
}

/// JPEG quality factor in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JpegQuality(f32);

impl JpegQuality {
    /// Convert a 0–100 percentage into a quality factor.
    ///
    /// Zero and negative values select maximum quality (1.0). Values above
    /// 100 are clamped to 1.0.
    pub fn from_percent(percent: i32) -> Self {
        if percent > 0 {
            Self((percent as f32 / 100.0).min(1.0))
        } else {
            Self(1.0)
        }
    }

    pub fn factor(self) -> f32 {
        self.0
    }

    /// Quality byte handed to the JPEG encoder (1–100).
    pub fn encoder_quality(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_maps_fixed_angles() {
        assert_eq!(Rotation::from_degrees(0), Rotation::None);
        assert_eq!(Rotation::from_degrees(90), Rotation::Clockwise90);
        assert_eq!(Rotation::from_degrees(180), Rotation::Clockwise180);
        assert_eq!(Rotation::from_degrees(270), Rotation::Clockwise270);
    }

    #[test]
    fn rotation_other_angles_are_none() {
        for degrees in [-90, 45, 89, 360, 450, i32::MAX] {
            assert_eq!(Rotation::from_degrees(degrees), Rotation::None, "{degrees}");
        }
    }

    #[test]
    fn rotation_degrees_roundtrip() {
        for degrees in [0, 90, 180, 270] {
            assert_eq!(Rotation::from_degrees(degrees).degrees(), degrees as u32);
        }
    }

    #[test]
    fn quarter_turns() {
        assert!(Rotation::Clockwise90.is_quarter_turn());
        assert!(Rotation::Clockwise270.is_quarter_turn());
        assert!(!Rotation::Clockwise180.is_quarter_turn());
        assert!(!Rotation::None.is_quarter_turn());
    }

    #[test]
    fn default_transform_is_identity_with_fant() {
        let transform = BitmapTransform::new();
        assert!(transform.is_identity());
        assert_eq!(transform.interpolation, Interpolation::Fant);
        assert!(!transform.ignore_orientation);
    }

    #[test]
    fn ignoring_orientation_keeps_geometry() {
        let transform = BitmapTransform::new()
            .with_scale(10, 20)
            .ignoring_orientation();
        assert!(transform.ignore_orientation);
        assert_eq!(
            transform.scaled,
            Some(Dimensions {
                width: 10,
                height: 20
            })
        );
    }

    #[test]
    fn transform_builders() {
        let transform = BitmapTransform::new()
            .with_scale(1000, 750)
            .with_rotation(Rotation::Clockwise270);
        assert_eq!(
            transform.scaled,
            Some(Dimensions {
                width: 1000,
                height: 750
            })
        );
        assert_eq!(transform.rotation, Rotation::Clockwise270);
        assert!(!transform.is_identity());
    }

    #[test]
    fn quality_zero_or_negative_is_maximum() {
        assert_eq!(JpegQuality::from_percent(0).factor(), 1.0);
        assert_eq!(JpegQuality::from_percent(-20).factor(), 1.0);
    }

    #[test]
    fn quality_percent_to_factor() {
        assert_eq!(JpegQuality::from_percent(50).factor(), 0.5);
        assert_eq!(JpegQuality::from_percent(100).factor(), 1.0);
        assert!((JpegQuality::from_percent(80).factor() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn quality_above_100_clamps() {
        assert_eq!(JpegQuality::from_percent(250).factor(), 1.0);
    }

    #[test]
    fn encoder_quality_values() {
        assert_eq!(JpegQuality::from_percent(80).encoder_quality(), 80);
        assert_eq!(JpegQuality::from_percent(0).encoder_quality(), 100);
        assert_eq!(JpegQuality::from_percent(1).encoder_quality(), 1);
    }
}
