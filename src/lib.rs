//! # Image Resizer
//!
//! Scales, rotates and re-encodes a single image file as JPEG. The caller's
//! file is never modified: it is copied to a scratch folder, transformed
//! there, and the result is written to a fixed file name in the scratch folder.
//!
//! # Architecture: One Linear Pipeline
//!
//! ```text
//! 1. Stage     photo.jpg    →  <scratch>/staging-XXXX/photoResizerCopy.jpg
//! 2. Scale     working copy →  longer oriented side = max_side
//! 3. Rotate    working copy →  0 / 90 / 180 / 270 degrees clockwise
//! 4. Encode    working copy →  <scratch>/tempResizedImage.jpg
//! 5. Clean up  staged copy deleted, output path returned
//! ```
//!
//! Each transform writes into memory and the result is committed back over
//! the staged copy, so exactly one working stream flows through the steps.
//! Any failure ends the request with an error naming the stage.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resize`] | The pipeline: [`ImageResizer`], request/error types, the host entry point |
//! | [`storage`] | Path normalization, staged copies, working/output streams |
//! | [`imaging`] | Dimension math, [`ImageBackend`], and the `image`-crate backend |
//! | [`config`] | `resizer.toml` loading, validation, and merging |
//! | [`output`] | CLI result formatting — plain path or JSON |
//!
//! # Design Decisions
//!
//! ## Backend Behind a Trait
//!
//! The pipeline only talks to imaging through [`ImageBackend`]'s three calls
//! (decode, transcode, encode). Tests drive the whole pipeline with a mock
//! that records transforms, so the sequencing and failure handling are
//! checked without decoding a single pixel.
//!
//! ## Pure-Rust Imaging
//!
//! [`RustBackend`] uses the `image` crate (Lanczos3 resampling, the built-in
//! JPEG encoder). No system libraries are required.
//!
//! ## Async Shell, Blocking Core
//!
//! [`ImageResizer::resize_image`] is an `async fn` with one `.await` per
//! stage. File I/O goes through `tokio::fs`; codec work runs on tokio's
//! blocking pool so a host runtime is never stalled by a large decode.
//!
//! ## Orientation
//!
//! Every transcode bakes the embedded EXIF orientation into the pixels and
//! writes no orientation tag, so pass-through images and orientations 2, 3
//! and 4 come out upright.
//!
//! The one exception is the 270° correction: when an image's embedded
//! orientation is a quarter turn and it is scaled, the scale step rotates
//! the stored pixel grid 270° instead of applying the tag. This turns
//! orientation 8 upright and keeps the aspect ratio for 5, 6 and 7. See
//! [`imaging::plan_scale`].

pub mod config;
pub mod imaging;
pub mod output;
pub mod resize;
pub mod storage;

pub use imaging::{ImageBackend, RustBackend};
pub use resize::{
    ImageResizer, Rejection, ResizeError, ResizeRequest, resize_image, resize_image_in,
};

#[cfg(test)]
pub(crate) mod test_helpers;
