//! Entry points used by the transport layer: open, close and page.

use crate::error::Result;
use crate::hub::{StreamHub, StreamSettings};
use crate::page::{LineWindow, read_window};
use crate::registry::HubRegistry;
use crate::viewer::{ViewerId, ViewerSink};
use std::sync::Arc;

/// A registered viewer and the hub it belongs to.
#[derive(Clone)]
pub struct ViewerHandle {
    pub id: ViewerId,
    pub hub: Arc<StreamHub>,
}

/// Owns the hub registry for one server instance.
pub struct LogService {
    registry: HubRegistry,
}

impl LogService {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            registry: HubRegistry::new(settings),
        }
    }

    pub fn registry(&self) -> &HubRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &StreamSettings {
        self.registry.settings()
    }

    /// Registers `sink` as a viewer of `path` and starts streaming to it.
    ///
    /// Open failures are returned before any state is created.
    pub async fn open_viewer(&self, path: &str, sink: Arc<dyn ViewerSink>) -> Result<ViewerHandle> {
        let hub = self.registry.get_or_create(path).await?;
        let id = hub.register(sink).await;
        Ok(ViewerHandle { id, hub })
    }

    /// Unregisters a viewer. Returns false if it was already gone.
    pub async fn close_viewer(&self, path: &str, id: ViewerId) -> bool {
        match self.registry.get(path) {
            Some(hub) => hub.unregister(id).await,
            None => false,
        }
    }

    /// Reads a window of `path` without touching any hub.
    pub async fn get_page(&self, path: &str, offset: i64, limit: i64) -> Result<LineWindow> {
        read_window(path, offset, limit).await
    }
}
