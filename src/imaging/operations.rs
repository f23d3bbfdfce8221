//! High-level image operations.
//!
//! These functions combine calculations with backend execution over streams.
//! Each reads its input stream from the start, runs the backend on tokio's
//! blocking pool, and returns a fresh in-memory stream (or fills the output
//! stream it was handed).

use super::backend::{BackendError, ImageBackend};
use super::calculations::{ScalePlan, plan_scale};
use super::params::{BitmapTransform, JpegQuality, Rotation};
use std::io::{Cursor, SeekFrom};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// In-memory seekable byte stream produced by a transform.
pub type MemoryStream = Cursor<Vec<u8>>;

/// Read a whole stream from position 0.
pub async fn read_stream<R>(stream: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    stream.seek(SeekFrom::Start(0)).await?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

/// Run a backend call on the blocking thread pool.
async fn run_blocking<B, T, F>(backend: &Arc<B>, op: F) -> Result<T>
where
    B: ImageBackend + 'static,
    T: Send + 'static,
    F: FnOnce(&B) -> Result<T> + Send + 'static,
{
    let backend = Arc::clone(backend);
    tokio::task::spawn_blocking(move || op(&backend))
        .await
        .map_err(|e| BackendError::ProcessingFailed(format!("Imaging task failed: {e}")))?
}

/// Scale an image so its longer oriented side equals `max_side`.
///
/// With `only_scale_down`, images already smaller than `max_side` on both
/// stored dimensions are re-encoded unchanged. See
/// [`plan_scale`](super::calculations::plan_scale) for the exact rules.
pub async fn scale_stream<B, R>(
    backend: &Arc<B>,
    stream: &mut R,
    max_side: u32,
    only_scale_down: bool,
) -> Result<MemoryStream>
where
    B: ImageBackend + 'static,
    R: AsyncRead + AsyncSeek + Unpin,
{
    let bytes = read_stream(stream).await?;
    let out = run_blocking(backend, move |backend| {
        let metadata = backend.decode(&bytes)?;
        let plan = plan_scale(&metadata, max_side, only_scale_down);
        match plan {
            ScalePlan::PassThrough => debug!(
                width = metadata.pixel_width,
                height = metadata.pixel_height,
                max_side,
                "already within bounds, passing through"
            ),
            ScalePlan::Scale {
                width,
                height,
                orientation_correction,
            } => debug!(
                from_width = metadata.oriented_pixel_width,
                from_height = metadata.oriented_pixel_height,
                width,
                height,
                orientation_correction,
                "scaling"
            ),
        }
        backend.transcode(&bytes, &plan.transform())
    })
    .await?;
    Ok(Cursor::new(out))
}

/// Rotate an image clockwise by 0, 90, 180 or 270 degrees.
///
/// Any other angle is a no-op transform (the image is still re-encoded).
pub async fn rotate_stream<B, R>(
    backend: &Arc<B>,
    stream: &mut R,
    degrees: i32,
) -> Result<MemoryStream>
where
    B: ImageBackend + 'static,
    R: AsyncRead + AsyncSeek + Unpin,
{
    let rotation = Rotation::from_degrees(degrees);
    debug!(requested = degrees, applied = rotation.degrees(), "rotating");

    let bytes = read_stream(stream).await?;
    let out = run_blocking(backend, move |backend| {
        // Decode first so unreadable input fails here rather than mid-transcode
        backend.decode(&bytes)?;
        backend.transcode(&bytes, &BitmapTransform::new().with_rotation(rotation))
    })
    .await?;
    Ok(Cursor::new(out))
}

/// Re-encode the image in `input` as JPEG and write it to `output`.
///
/// `quality` is a 0–100 percentage; zero or negative means maximum quality.
/// Returns the number of bytes written.
pub async fn convert_to_jpeg<B, R, W>(
    backend: &Arc<B>,
    input: &mut R,
    output: &mut W,
    quality: i32,
) -> Result<usize>
where
    B: ImageBackend + 'static,
    R: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    let quality = JpegQuality::from_percent(quality);
    let bytes = read_stream(input).await?;
    let jpeg = run_blocking(backend, move |backend| backend.encode_jpeg(&bytes, quality)).await?;

    output.write_all(&jpeg).await?;
    output.flush().await?;
    debug!(quality = quality.factor(), bytes = jpeg.len(), "encoded JPEG");
    Ok(jpeg.len())
}
