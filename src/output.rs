//! CLI output formatting.
//!
//! Stdout carries only the result so the command composes in scripts; every
//! diagnostic goes to stderr (log lines come from `tracing`).
//!
//! # Output Format
//!
//! ## Text
//!
//! ```text
//! $ image-resizer resize photo.jpg
//! /tmp/tempResizedImage.jpg
//!
//! $ image-resizer resize missing.jpg
//! Error: Failed to copy the image to temporary storage: No such file or directory (os error 2)
//!     Path: missing.jpg
//! ```
//!
//! ## JSON (`--json`)
//!
//! ```text
//! {"path":"/tmp/tempResizedImage.jpg"}
//! {"message":"Failed to copy the image ...","context":"missing.jpg"}
//! ```
//!
//! # Architecture
//!
//! Each outcome has a `format_*` function (pure, returns lines or a string)
//! and a `print_*` wrapper that writes to the right stream.

use crate::resize::Rejection;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Resolution<'a> {
    path: &'a str,
}

// ============================================================================
// Success
// ============================================================================

pub fn format_resolution(path: &Path) -> String {
    path.display().to_string()
}

pub fn format_resolution_json(path: &Path) -> serde_json::Result<String> {
    let path = path.display().to_string();
    serde_json::to_string(&Resolution { path: &path })
}

pub fn print_resolution(path: &Path, json: bool) -> serde_json::Result<()> {
    let line = if json {
        format_resolution_json(path)?
    } else {
        format_resolution(path)
    };
    println!("{line}");
    Ok(())
}

// ============================================================================
// Failure
// ============================================================================

pub fn format_rejection(rejection: &Rejection) -> Vec<String> {
    let mut lines = vec![format!("Error: {}", rejection.message)];
    if !rejection.context.is_empty() {
        lines.push(format!("    Path: {}", rejection.context));
    }
    lines
}

pub fn format_rejection_json(rejection: &Rejection) -> serde_json::Result<String> {
    serde_json::to_string(rejection)
}

pub fn print_rejection(rejection: &Rejection, json: bool) -> serde_json::Result<()> {
    if json {
        eprintln!("{}", format_rejection_json(rejection)?);
    } else {
        for line in format_rejection(rejection) {
            eprintln!("{line}");
        }
    }
    Ok(())
}
