//! Error type for the terminal engine

use thiserror::Error;

use weact_core::{DisplayError, FontError};

use crate::pty::PtyError;

#[derive(Error, Debug)]
pub enum TermError {
    #[error("Failed to set raw mode: {0}")]
    RawMode(#[source] std::io::Error),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("poll failed: {0}")]
    Poll(#[source] std::io::Error),
}
