//! Error types for the log streaming engine.

use std::io;
use std::path::Path;
use thiserror::Error;

/// The main error type for streaming and pagination operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The path did not exist when it was opened.
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// The path exists but cannot be opened or read.
    #[error("Cannot read file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A viewer's transport rejected a frame. Local to that viewer.
    #[error("Viewer transport failed: {reason}")]
    TransportFailure { reason: String },

    /// The follow loop lost its file after streaming had started.
    #[error("Source terminated: {path}")]
    SourceTerminated { path: String },

    /// I/O errors while following an already opened file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

impl Error {
    /// Classifies an error raised while opening or reading `path`.
    pub(crate) fn from_open(path: &Path, source: io::Error) -> Self {
        let path = path.display().to_string();
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path },
            _ => Error::Unreadable { path, source },
        }
    }

    /// True for the errors reported synchronously to a connecting viewer.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Unreadable { .. })
    }
}

/// A convenient Result type for streaming operations.
pub type Result<T> = std::result::Result<T, Error>;
