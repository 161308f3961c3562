//! Follow stream: yields lines appended to a file after it was opened.

use crate::error::{Error, Result};
use crate::reader::take_complete_lines;
use crate::watcher::{FileWatcher, is_event_relevant_to_file, is_removal};
use futures::Stream;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const READ_CHUNK: usize = 8 * 1024;
/// Lines buffered between the follow task and its consumer.
const LINE_BUFFER: usize = 1024;

/// A stream of lines appended to a file, starting at the end-of-file observed
/// when the stream was created.
///
/// The stream ends without an error item when the file handle fails or the
/// path disappears. Rotation is not followed.
pub struct FollowStream {
    receiver: mpsc::Receiver<String>,
    _shutdown_tx: broadcast::Sender<()>,
    _task_handle: JoinHandle<()>,
}

impl FollowStream {
    /// Opens `path`, seeks to its end and starts the background reader.
    pub(crate) async fn start(path: &Path, poll_interval: Duration) -> Result<Self> {
        let file_path = path.to_path_buf();

        let mut file = File::open(&file_path)
            .await
            .map_err(|e| Error::from_open(&file_path, e))?;
        file.seek(SeekFrom::End(0))
            .await
            .map_err(|e| Error::from_open(&file_path, e))?;

        let mut watcher = FileWatcher::new(&file_path)?;
        watcher.start_watching()?;

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task_handle = tokio::spawn(async move {
            let path_label = file_path.display().to_string();
            match follow_task(file, watcher, file_path, poll_interval, tx, shutdown_rx).await {
                Ok(()) => tracing::debug!(path = %path_label, "follow task stopped"),
                Err(e) => tracing::warn!(path = %path_label, error = %e, "follow task terminated"),
            }
        });

        Ok(FollowStream {
            receiver: rx,
            _shutdown_tx: shutdown_tx,
            _task_handle: task_handle,
        })
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for FollowStream {
    fn drop(&mut self) {
        let _ = self._shutdown_tx.send(());
    }
}

impl Stream for FollowStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Background task that reads appended bytes and emits complete lines.
async fn follow_task(
    mut file: File,
    mut watcher: FileWatcher,
    file_path: PathBuf,
    poll_interval: Duration,
    tx: mpsc::Sender<String>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let file_name = watcher.file_name();
    let mut pending = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut check_exists = false;

    loop {
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            pending.extend_from_slice(&chunk[..read]);
            for line in take_complete_lines(&mut pending) {
                if tx.send(line).await.is_err() {
                    // Nobody is listening anymore.
                    return Ok(());
                }
            }
        }

        if check_exists && !fs::try_exists(&file_path).await.unwrap_or(false) {
            return Err(Error::SourceTerminated {
                path: file_path.display().to_string(),
            });
        }

        check_exists = tokio::select! {
            _ = shutdown_rx.recv() => return Ok(()),

            event = watcher.next_event() => match event {
                Some(Ok(event)) => is_event_relevant_to_file(&event, &file_name) && is_removal(&event),
                Some(Err(e)) => {
                    tracing::debug!(path = %file_path.display(), error = %e, "watcher error, relying on polling");
                    false
                }
                None => return Ok(()),
            },

            _ = tokio::time::sleep(poll_interval) => true,
        };
    }
}
