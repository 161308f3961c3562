//! Viewer transport abstraction.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};

/// Hub-unique identifier handed out when a viewer registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub(crate) u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Per-connection sink for text frames.
///
/// `send` fails with [`Error::TransportFailure`] once the underlying
/// connection is gone; the hub then drops the viewer.
#[async_trait]
pub trait ViewerSink: Send + Sync {
    async fn send(&self, frame: String) -> Result<()>;

    /// Releases the transport. Called once the hub forgets the viewer.
    async fn close(&self) {}
}

/// A [`ViewerSink`] feeding a bounded channel drained by a connection writer.
///
/// Sends never wait: a full channel means the connection stopped draining, and
/// the send fails so the hub drops this viewer instead of stalling the rest.
/// Closing drops the sender, which ends the writer once any other senders are
/// gone too.
pub struct ChannelSink {
    tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    pub async fn is_closed(&self) -> bool {
        match self.tx.lock().await.as_ref() {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}

#[async_trait]
impl ViewerSink for ChannelSink {
    async fn send(&self, frame: String) -> Result<()> {
        let tx = self.tx.lock().await.clone().ok_or_else(|| Error::TransportFailure {
            reason: "viewer closed".to_string(),
        })?;

        tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => Error::TransportFailure {
                reason: "viewer too slow".to_string(),
            },
            TrySendError::Closed(_) => Error::TransportFailure {
                reason: "connection writer gone".to_string(),
            },
        })
    }

    async fn close(&self) {
        self.tx.lock().await.take();
    }
}
