//! Filesystem side of the pipeline: paths, staged copies, and streams.
//!
//! The caller's file is never opened for writing. It is copied into the
//! scratch folder under a derived name and every transform works on that
//! copy:
//!
//! ```text
//! /photos/IMG_0042.jpg
//!     → <scratch>/staging-XXXX/IMG_0042ResizerCopy.jpg   (staged copy, working stream)
//!     → <scratch>/tempResizedImage.jpg                   (final JPEG)
//! ```
//!
//! [`StagedFile`] removes the staged copy and its folder when dropped, so a
//! failure at any step after staging still cleans up.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Prefix of the per-request folders created inside the scratch directory.
const STAGING_PREFIX: &str = "staging-";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path contains a NUL byte")]
    ContainsNul,
}

// =============================================================================
// Path normalization
// =============================================================================

/// Turn caller-supplied text into a native path.
///
/// Surrounding whitespace is trimmed. On Windows forward slashes become
/// backslashes; elsewhere the text is used as-is.
pub fn normalize_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if trimmed.contains('\0') {
        return Err(PathError::ContainsNul);
    }
    Ok(PathBuf::from(make_preferred(trimmed)))
}

#[cfg(windows)]
fn make_preferred(path: &str) -> String {
    path.replace('/', "\\")
}

#[cfg(not(windows))]
fn make_preferred(path: &str) -> String {
    path.to_string()
}

// =============================================================================
// Staging
// =============================================================================

/// Name of the staged copy: `<stem><suffix>.<extension>`.
///
/// ```
/// # use image_resizer::storage::staged_file_name;
/// # use std::path::Path;
/// assert_eq!(
///     staged_file_name(Path::new("/photos/dawn.jpg"), "ResizerCopy").as_deref(),
///     Some("dawnResizerCopy.jpg")
/// );
/// ```
pub fn staged_file_name(source: &Path, suffix: &str) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    Some(match source.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    })
}

/// A temporary copy of the source image, deleted when dropped.
///
/// The copy lives in its own folder under the scratch directory, so
/// concurrent requests for same-named sources never share a staged path.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged copy and its folder now, reporting any failure.
    pub async fn delete(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => tokio::task::spawn_blocking(move || dir.close())
                .await
                .map_err(std::io::Error::other)?,
            None => Ok(()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "removed staged copy"),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove staged copy")
            }
        }
    }
}

/// Copy `source` into a fresh folder under `scratch_dir`, under its staged name.
///
/// The scratch folder is created if missing. The source is only read.
pub async fn stage_copy(
    source: &Path,
    scratch_dir: &Path,
    suffix: &str,
) -> std::io::Result<StagedFile> {
    let metadata = tokio::fs::metadata(source).await?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a file", source.display()),
        ));
    }

    let name = staged_file_name(source, suffix).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        )
    })?;

    tokio::fs::create_dir_all(scratch_dir).await?;
    let dir = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(scratch_dir)?;
    let path = dir.path().join(name);
    tokio::fs::copy(source, &path).await?;
    debug!(from = %source.display(), to = %path.display(), "staged copy");

    Ok(StagedFile {
        path,
        dir: Some(dir),
    })
}

// =============================================================================
// Streams
// =============================================================================

/// Open an existing file for reading and writing in place.
pub async fn open_read_write(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path).await
}

/// Create (or truncate) `name` inside `dir` and open it read-write.
pub async fn create_output(dir: &Path, name: &str) -> std::io::Result<(PathBuf, File)> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .await?;
    Ok((path, file))
}

/// Replace the contents of `working` with everything in `source`.
///
/// Both streams are rewound, `working` is truncated, then `source` is copied
/// in and flushed. Returns the number of bytes copied.
pub async fn replace_contents<S>(working: &mut File, source: &mut S) -> std::io::Result<u64>
where
    S: AsyncRead + AsyncSeek + Unpin,
{
    source.seek(SeekFrom::Start(0)).await?;
    working.seek(SeekFrom::Start(0)).await?;
    working.set_len(0).await?;
    let copied = tokio::io::copy(source, working).await?;
    working.flush().await?;
    Ok(copied)
}
