//! Error type for the scan pipeline.
//!
//! Only setup problems and filesystem failures live here. A missing page, an HTTP 404, a soft-404
//! redirect or a page without the expected marker is a normal outcome and never becomes an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    // Setup
    #[error("Scan label must not be empty.")]
    EmptyTitle,

    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Invalid {name} pattern: {reason}")]
    InvalidPattern { name: &'static str, reason: String },

    // Filesystem (fatal for the run)
    #[error("Cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot create file in {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot move downloaded file into place at {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}
