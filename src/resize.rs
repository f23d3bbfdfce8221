//! The resize pipeline.
//!
//! One request runs a fixed, linear sequence of stages. Each stage either
//! hands its result to the next or ends the request with a [`ResizeError`]
//! naming the stage:
//!
//! ```text
//! path ─► normalize ─► stage copy ─► open working stream
//!      ─► scale ─► commit ─► rotate ─► commit
//!      ─► create output ─► encode JPEG ─► delete staged copy ─► output path
//! ```
//!
//! Between transforms the in-memory result is written back over the staged
//! copy, so a single working stream flows through every step. The caller's
//! file is only ever read.
//!
//! ## Cleanup
//!
//! The staged copy is held by a [`StagedFile`](crate::storage::StagedFile)
//! guard and is removed even when a later stage fails. A JPEG that fails
//! mid-encode is deleted rather than left behind half-written.

use crate::config::{RequestDefaults, StorageConfig};
use crate::imaging::{
    BackendError, ImageBackend, MemoryStream, RustBackend, convert_to_jpeg, rotate_stream,
    scale_stream,
};
use crate::storage::{self, PathError};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Parameters of one resize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    /// Path of the source image, as supplied by the caller.
    pub path: String,
    /// Length of the longer oriented side after scaling.
    pub max_side: u32,
    /// JPEG quality percentage; zero or negative means maximum.
    pub quality: i32,
    /// Clockwise degrees; anything but 90, 180 or 270 means no rotation.
    pub rotation: i32,
    /// Leave images already under `max_side` at their size.
    pub only_scale_down: bool,
}

impl ResizeRequest {
    /// A request for `path` using the stock defaults.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_defaults(path, &RequestDefaults::default())
    }

    /// A request for `path` using configured defaults.
    pub fn with_defaults(path: impl Into<String>, defaults: &RequestDefaults) -> Self {
        Self {
            path: path.into(),
            max_side: defaults.max_side,
            quality: i32::try_from(defaults.quality).unwrap_or(100),
            rotation: defaults.rotation,
            only_scale_down: defaults.only_scale_down,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Logical pipeline stage, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StageCopy,
    OpenStream,
    Scale,
    CommitScaled,
    Rotate,
    CommitRotated,
    CreateOutput,
    Encode,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::StageCopy => "copy the image to temporary storage",
            Self::OpenStream => "open the image for processing",
            Self::Scale => "scale the image",
            Self::CommitScaled => "save the scaled image",
            Self::Rotate => "rotate the image",
            Self::CommitRotated => "save the rotated image",
            Self::CreateOutput => "create the output file",
            Self::Encode => "encode the JPEG",
            Self::Cleanup => "remove the temporary copy",
        };
        f.write_str(action)
    }
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid path: {source}")]
    InvalidPath {
        input: String,
        #[source]
        source: PathError,
    },
    #[error("Failed to {stage}: {source}")]
    FileAccess {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to {stage}: {source}")]
    Imaging {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Failed to {stage}: no image data was produced")]
    NullResult { stage: Stage, path: PathBuf },
}

impl ResizeError {
    /// The stage that failed, if the request got past validation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidRequest(_) | Self::InvalidPath { .. } => None,
            Self::FileAccess { stage, .. }
            | Self::Imaging { stage, .. }
            | Self::NullResult { stage, .. } => Some(*stage),
        }
    }

    /// The path the failure concerns: normalized when available, raw otherwise.
    pub fn context(&self) -> String {
        match self {
            Self::InvalidRequest(_) => String::new(),
            Self::InvalidPath { input, .. } => input.clone(),
            Self::FileAccess { path, .. }
            | Self::Imaging { path, .. }
            | Self::NullResult { path, .. } => path.display().to_string(),
        }
    }

    fn file_access(stage: Stage, path: &Path, source: std::io::Error) -> Self {
        Self::FileAccess {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }

    fn imaging(stage: Stage, path: &Path, source: BackendError) -> Self {
        Self::Imaging {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Failure as reported to the host: a message plus the path it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub message: String,
    pub context: String,
}

impl From<&ResizeError> for Rejection {
    fn from(err: &ResizeError) -> Self {
        Self {
            message: err.to_string(),
            context: err.context(),
        }
    }
}

impl From<ResizeError> for Rejection {
    fn from(err: ResizeError) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} ({})", self.message, self.context)
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs resize requests against an imaging backend.
///
/// Holds no per-request state; one resizer can serve concurrent requests,
/// which only contend on the shared output file name.
pub struct ImageResizer<B> {
    backend: Arc<B>,
    storage: StorageConfig,
}

impl<B: ImageBackend + 'static> ImageResizer<B> {
    pub fn new(backend: B, storage: StorageConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), storage)
    }

    pub fn with_shared_backend(backend: Arc<B>, storage: StorageConfig) -> Self {
        Self { backend, storage }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Scale, rotate and re-encode the image at `request.path` as JPEG.
    ///
    /// Returns the path of the written JPEG inside the scratch folder. The
    /// same path is reused (and overwritten) by every call.
    pub async fn resize_image(&self, request: &ResizeRequest) -> Result<PathBuf, ResizeError> {
        if request.max_side == 0 {
            return Err(ResizeError::InvalidRequest(
                "max_side must be greater than 0".into(),
            ));
        }

        let source =
            storage::normalize_path(&request.path).map_err(|source| ResizeError::InvalidPath {
                input: request.path.clone(),
                source,
            })?;
        let scratch = self.storage.temp_dir();
        debug!(source = %source.display(), scratch = %scratch.display(), "starting resize");

        let staged = storage::stage_copy(&source, &scratch, &self.storage.copy_suffix)
            .await
            .map_err(|e| ResizeError::file_access(Stage::StageCopy, &source, e))?;

        let mut working = storage::open_read_write(staged.path())
            .await
            .map_err(|e| ResizeError::file_access(Stage::OpenStream, &source, e))?;

        let mut scaled = scale_stream(
            &self.backend,
            &mut working,
            request.max_side,
            request.only_scale_down,
        )
        .await
        .map_err(|e| ResizeError::imaging(Stage::Scale, &source, e))?;
        ensure_produced(&scaled, Stage::Scale, &source)?;
        storage::replace_contents(&mut working, &mut scaled)
            .await
            .map_err(|e| ResizeError::file_access(Stage::CommitScaled, &source, e))?;
        drop(scaled);

        let mut rotated = rotate_stream(&self.backend, &mut working, request.rotation)
            .await
            .map_err(|e| ResizeError::imaging(Stage::Rotate, &source, e))?;
        ensure_produced(&rotated, Stage::Rotate, &source)?;
        storage::replace_contents(&mut working, &mut rotated)
            .await
            .map_err(|e| ResizeError::file_access(Stage::CommitRotated, &source, e))?;
        drop(rotated);

        let (output_path, mut output) =
            storage::create_output(&scratch, &self.storage.output_name)
                .await
                .map_err(|e| ResizeError::file_access(Stage::CreateOutput, &source, e))?;

        let encoded = convert_to_jpeg(&self.backend, &mut working, &mut output, request.quality)
            .await
            .map_err(|e| ResizeError::imaging(Stage::Encode, &source, e))
            .and_then(|written| {
                if written == 0 {
                    Err(ResizeError::NullResult {
                        stage: Stage::Encode,
                        path: source.clone(),
                    })
                } else {
                    Ok(written)
                }
            });
        drop(output);
        drop(working);

        let written = match encoded {
            Ok(written) => written,
            Err(e) => {
                discard_output(&output_path).await;
                return Err(e);
            }
        };

        staged
            .delete()
            .await
            .map_err(|e| ResizeError::file_access(Stage::Cleanup, &source, e))?;

        info!(
            source = %source.display(),
            output = %output_path.display(),
            bytes = written,
            "resized image"
        );
        Ok(output_path)
    }
}

fn ensure_produced(stream: &MemoryStream, stage: Stage, source: &Path) -> Result<(), ResizeError> {
    if stream.get_ref().is_empty() {
        return Err(ResizeError::NullResult {
            stage,
            path: source.to_path_buf(),
        });
    }
    Ok(())
}

async fn discard_output(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove partial output");
    }
}

/// Host entry point: resize with the default storage layout and the
/// `image`-crate backend.
///
/// Resolves with the output path, or rejects with a message and the path it
/// concerns.
pub async fn resize_image(
    path: &str,
    max_side: u32,
    quality: i32,
    rotation: i32,
    only_scale_down: bool,
) -> Result<String, Rejection> {
    resize_image_in(
        &StorageConfig::default(),
        path,
        max_side,
        quality,
        rotation,
        only_scale_down,
    )
    .await
}

/// [`resize_image`] with an explicit storage layout.
pub async fn resize_image_in(
    storage: &StorageConfig,
    path: &str,
    max_side: u32,
    quality: i32,
    rotation: i32,
    only_scale_down: bool,
) -> Result<String, Rejection> {
    let resizer = ImageResizer::new(RustBackend::new(), storage.clone());
    let request = ResizeRequest {
        path: path.to_string(),
        max_side,
        quality,
        rotation,
        only_scale_down,
    };
    resizer
        .resize_image(&request)
        .await
        .map(|p| p.display().to_string())
        .map_err(Rejection::from)
}
