//! Test utilities for temporary log files and recording viewers.

use crate::error::{Error, Result};
use crate::viewer::ViewerSink;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

pub struct TempLogFile {
    pub path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TempLogFile {
    /// Create a new empty temporary log file
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("test.log");

        File::create(&path)?;

        Ok(Self {
            path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a temporary log file holding `lines`, each newline-terminated
    pub fn with_lines(lines: &[&str]) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        for line in lines {
            temp_file.append_line(line)?;
        }
        Ok(temp_file)
    }

    /// Create a temporary log file holding `count` numbered lines
    pub fn with_numbered_lines(count: usize) -> std::io::Result<Self> {
        let temp_file = Self::new()?;
        let mut content = String::new();
        for i in 0..count {
            content.push_str(&format!("line {}\n", i));
        }
        temp_file.append_raw(&content)?;
        Ok(temp_file)
    }

    /// Append one newline-terminated line
    pub fn append_line(&self, line: &str) -> std::io::Result<()> {
        self.append_raw(&format!("{}\n", line))
    }

    /// Append bytes without adding a delimiter
    pub fn append_raw(&self, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Delete the file while keeping the directory around
    pub fn remove(&self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

/// A viewer that forwards every frame into a channel the test can inspect.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<String>,
}

impl RecordingSink {
    pub fn new() -> (Self, FrameLog) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, FrameLog { rx })
    }
}

#[async_trait]
impl ViewerSink for RecordingSink {
    async fn send(&self, frame: String) -> Result<()> {
        self.tx.send(frame).map_err(|_| Error::TransportFailure {
            reason: "recording closed".to_string(),
        })
    }
}

/// Receiving end of a [`RecordingSink`].
pub struct FrameLog {
    rx: mpsc::UnboundedReceiver<String>,
}

impl FrameLog {
    /// Waits for the next frame, panicking after a generous timeout
    pub async fn next(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("sink dropped")
    }

    /// Collects exactly `count` frames
    pub async fn take(&mut self, count: usize) -> Vec<String> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(self.next().await);
        }
        frames
    }

    /// Asserts no frame arrives within `wait`
    pub async fn assert_quiet(&mut self, wait: Duration) {
        if let Ok(Some(frame)) = tokio::time::timeout(wait, self.rx.recv()).await {
            panic!("unexpected frame: {}", frame);
        }
    }
}

/// A viewer whose transport is already gone.
pub struct FailingSink;

#[async_trait]
impl ViewerSink for FailingSink {
    async fn send(&self, _frame: String) -> Result<()> {
        Err(Error::TransportFailure {
            reason: "connection reset".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_log_file_creation() {
        let temp_file = TempLogFile::new().unwrap();
        assert!(temp_file.path().exists());
    }

    #[tokio::test]
    async fn test_with_lines_terminates_each_line() {
        let temp_file = TempLogFile::with_lines(&["a", "b"]).unwrap();
        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "a\nb\n");
    }

    #[tokio::test]
    async fn test_with_numbered_lines() {
        let temp_file = TempLogFile::with_numbered_lines(3).unwrap();
        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "line 0\nline 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_remove() {
        let temp_file = TempLogFile::with_lines(&["x"]).unwrap();
        temp_file.remove().unwrap();
        assert!(!temp_file.path().exists());
    }
}
