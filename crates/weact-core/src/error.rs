//! Error types for display and font operations

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the transport and the device handle
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to open port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Display not connected")]
    NotConnected,

    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Incomplete write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Invalid orientation value {0}, use 0-3 or 5")]
    InvalidOrientation(u8),
}

/// Errors raised while loading a font
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a usable font file: {0}")]
    Invalid(PathBuf),

    #[error("Font size {0} out of range (6-32)")]
    InvalidSize(u32),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
