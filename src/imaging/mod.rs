//! Image processing — pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode metadata** | `ImageDecoder` header + EXIF orientation + custom density reader |
//! | **Scale** | `resize_exact` with Lanczos3 (`Fant`) |
//! | **Rotate** | `rotate90` / `rotate180` / `rotate270` |
//! | **Encode → JPEG** | `JpegEncoder` with quality + pixel density |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Async stream steps combining calculations + backend

pub mod backend;
mod calculations;
pub(crate) mod density;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{AlphaMode, BackendError, Dimensions, ImageBackend, ImageMetadata, PixelFormat};
pub use calculations::{ScalePlan, calculate_scaled_dimensions, plan_scale};
pub use operations::{MemoryStream, convert_to_jpeg, rotate_stream, scale_stream};
pub use params::{BitmapTransform, Interpolation, JpegQuality, Rotation};
pub use rust_backend::RustBackend;
