//! Line source: whole-file reads and line splitting for a single log path.

use crate::error::{Error, Result};
use crate::stream::FollowStream;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};

/// A single monitored file, addressed by the path it was opened with.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    /// Opens `path` once to make sure it exists and is readable.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| Error::from_open(&path, e))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| Error::from_open(&path, e))?;

        if metadata.is_dir() {
            return Err(Error::Unreadable {
                path: path.display().to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
            });
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entire file top to bottom as ordered lines.
    pub async fn snapshot(&self) -> Result<Vec<String>> {
        read_lines(&self.path).await
    }

    /// Follows the file from its current end, yielding lines appended afterwards.
    pub async fn follow(&self, poll_interval: Duration) -> Result<FollowStream> {
        FollowStream::start(&self.path, poll_interval).await
    }
}

/// Reads `path` and splits it into lines.
pub(crate) async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read(path).await.map_err(|e| Error::from_open(path, e))?;
    Ok(split_lines(&content))
}

/// Splits whole-file content into lines.
///
/// Empty lines are kept and a final line without a trailing newline is still
/// returned, matching a buffered scanner run to end-of-file.
pub(crate) fn split_lines(content: &[u8]) -> Vec<String> {
    let mut parts: Vec<&[u8]> = content.split(|b| *b == b'\n').collect();
    if parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    parts.into_iter().map(decode_line).collect()
}

/// Drains every newline-terminated line out of `pending`.
///
/// Bytes after the last newline stay buffered until their delimiter arrives.
pub(crate) fn take_complete_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let Some(last_newline) = pending.iter().rposition(|b| *b == b'\n') else {
        return Vec::new();
    };

    let rest = pending.split_off(last_newline + 1);
    let complete = std::mem::replace(pending, rest);
    split_lines(&complete)
}

/// Index of the first line of a tail of at most `max` lines.
pub(crate) fn tail_start(total: usize, max: usize) -> usize {
    total.saturating_sub(max)
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
