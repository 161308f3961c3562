//! Per-file broadcaster: viewer set, join snapshots and the follow loop.
//!
//! Every viewer of one path shares a single [`StreamHub`]. The hub hands each
//! new viewer a snapshot of the file's tail followed by an `INITIAL_LOAD`
//! metadata frame, and pushes every line the follow loop reads to all viewers.
//!
//! The snapshot is read independently of the follow loop. A viewer joining
//! while lines are being appended may receive a line both in its snapshot and
//! as a live frame, and snapshot and live frames may interleave on the wire.
//! Lines appended after the snapshot read are always delivered live, exactly
//! once, in file order.

use crate::error::{Error, Result};
use crate::frame::{Framing, MetaRecord};
use crate::reader::{LineSource, tail_start};
use crate::stream::FollowStream;
use crate::viewer::{ViewerId, ViewerSink};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio_stream::StreamExt;

pub const DEFAULT_SNAPSHOT_LINES: usize = 200;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Tuning shared by every hub of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Maximum number of tail lines sent to a joining viewer.
    pub snapshot_lines: usize,
    /// Fallback wakeup interval of the follow loop.
    pub poll_interval: Duration,
    pub framing: Framing,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            snapshot_lines: DEFAULT_SNAPSHOT_LINES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            framing: Framing::default(),
        }
    }
}

/// Follow-loop lifecycle of a hub.
///
/// `SourceTerminated` is only reached when the followed file errors or
/// disappears; viewers stay registered but receive nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    Uninitialized,
    Following,
    SourceTerminated,
}

pub struct StreamHub {
    source: LineSource,
    settings: StreamSettings,
    viewers: Mutex<HashMap<ViewerId, Arc<dyn ViewerSink>>>,
    next_viewer: AtomicU64,
    state: watch::Sender<HubState>,
}

impl StreamHub {
    pub fn new(source: LineSource, settings: StreamSettings) -> Self {
        let (state, _) = watch::channel(HubState::Uninitialized);
        Self {
            source,
            settings,
            viewers: Mutex::new(HashMap::new()),
            next_viewer: AtomicU64::new(1),
            state,
        }
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn state(&self) -> HubState {
        *self.state.borrow()
    }

    /// Watches follow-loop state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<HubState> {
        self.state.subscribe()
    }

    pub async fn viewer_count(&self) -> usize {
        self.viewers.lock().await.len()
    }

    /// Adds a viewer and spawns delivery of its join snapshot.
    pub async fn register(self: &Arc<Self>, sink: Arc<dyn ViewerSink>) -> ViewerId {
        let id = ViewerId(self.next_viewer.fetch_add(1, Ordering::Relaxed));
        self.viewers.lock().await.insert(id, Arc::clone(&sink));

        tracing::info!(path = %self.path().display(), viewer = %id, "viewer registered");

        let hub = Arc::clone(self);
        tokio::spawn(async move {
            match hub.send_snapshot(&sink).await {
                Ok(shown) => {
                    tracing::debug!(path = %hub.path().display(), viewer = %id, shown, "snapshot sent");
                }
                Err(e @ Error::TransportFailure { .. }) => {
                    tracing::warn!(viewer = %id, error = %e, "snapshot delivery failed");
                    hub.unregister(id).await;
                }
                Err(e) => {
                    tracing::warn!(path = %hub.path().display(), viewer = %id, error = %e, "snapshot read failed");
                }
            }
        });

        id
    }

    /// Sends the file's tail followed by the `INITIAL_LOAD` record.
    ///
    /// Returns the number of log lines sent.
    pub(crate) async fn send_snapshot(&self, sink: &Arc<dyn ViewerSink>) -> Result<usize> {
        let lines = self.source.snapshot().await?;
        let total = lines.len();
        let start = tail_start(total, self.settings.snapshot_lines);

        for line in lines.into_iter().skip(start) {
            sink.send(line).await?;
        }

        let shown = total - start;
        sink.send(self.settings.framing.meta(MetaRecord::InitialLoad { total, shown }))
            .await?;
        Ok(shown)
    }

    /// Removes a viewer and releases its transport. Unknown ids are a no-op.
    pub async fn unregister(&self, id: ViewerId) -> bool {
        let removed = self.viewers.lock().await.remove(&id);
        match removed {
            Some(sink) => {
                sink.close().await;
                tracing::info!(path = %self.path().display(), viewer = %id, "viewer unregistered");
                true
            }
            None => false,
        }
    }

    /// Delivers `line` to every registered viewer.
    ///
    /// Sends run concurrently; viewers whose send fails are dropped in the same
    /// pass without affecting delivery to the others.
    pub async fn broadcast(&self, line: &str) {
        let mut viewers = self.viewers.lock().await;

        let sends = viewers.iter().map(|(id, sink)| {
            let frame = line.to_string();
            async move { (*id, sink.send(frame).await) }
        });
        let failed: Vec<(ViewerId, Error)> = join_all(sends)
            .await
            .into_iter()
            .filter_map(|(id, result)| result.err().map(|e| (id, e)))
            .collect();

        for (id, error) in failed {
            if let Some(sink) = viewers.remove(&id) {
                tracing::warn!(path = %self.path().display(), viewer = %id, error = %error, "dropping viewer after failed send");
                sink.close().await;
            }
        }
    }

    /// Starts the follow loop unless it already runs.
    ///
    /// Returns `Ok(false)` when the hub was already following.
    pub async fn start_following(self: &Arc<Self>) -> Result<bool> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == HubState::Uninitialized {
                *state = HubState::Following;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Ok(false);
        }

        let stream = match self.source.follow(self.settings.poll_interval).await {
            Ok(stream) => stream,
            Err(e) => {
                self.state.send_replace(HubState::Uninitialized);
                return Err(e);
            }
        };

        let hub = Arc::downgrade(self);
        let path = self.path().display().to_string();
        tokio::spawn(follow_loop(hub, stream));

        tracing::info!(path = %path, "started following");
        Ok(true)
    }
}

async fn follow_loop(hub: Weak<StreamHub>, mut stream: FollowStream) {
    while let Some(line) = stream.next().await {
        let Some(hub) = hub.upgrade() else {
            return;
        };
        hub.broadcast(&line).await;
    }

    if let Some(hub) = hub.upgrade() {
        hub.state.send_replace(HubState::SourceTerminated);
        let viewers = hub.viewer_count().await;
        tracing::warn!(
            path = %hub.path().display(),
            viewers,
            "follow loop ended, viewers will receive no further lines"
        );
    }
}
