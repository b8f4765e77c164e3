// Error types for four_bars_music.
//
// Lookups never fail (they degrade to rests); these are the hard errors:
// a bad chord root or pitch spelling, a failed export, a malformed table
// file, and plain I/O while preparing the app directory.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FourBarsError {
    #[error("Invalid chord root: {0:?}")]
    InvalidRoot(String),
    #[error("Invalid pitch spelling: {0:?}")]
    InvalidPitch(String),
    #[error("Export to {path} failed: {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed table {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FourBarsError>;
