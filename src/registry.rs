//! Process-scoped map from file path to its [`StreamHub`].

use crate::error::Result;
use crate::hub::{StreamHub, StreamSettings};
use crate::reader::LineSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

type HubSlot = Arc<OnceCell<Arc<StreamHub>>>;

/// Lazily creates one hub per path and keeps it for the life of the registry.
///
/// Paths are keys verbatim: two spellings of the same file get two hubs. The
/// map lock is only held to look up a slot; hub construction is serialized
/// per path by that slot.
pub struct HubRegistry {
    settings: StreamSettings,
    hubs: Mutex<HashMap<String, HubSlot>>,
}

impl HubRegistry {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            settings,
            hubs: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Returns the hub for `path`, creating it and starting its follow loop on
    /// first use.
    ///
    /// Fails with `NotFound` or `Unreadable` when the path cannot be opened,
    /// in which case nothing is stored.
    pub async fn get_or_create(&self, path: &str) -> Result<Arc<StreamHub>> {
        let slot = {
            let mut hubs = self.lock();
            Arc::clone(hubs.entry(path.to_string()).or_default())
        };

        let result = slot
            .get_or_try_init(|| self.create(path))
            .await
            .map(Arc::clone);

        if result.is_err() {
            self.forget_empty(path, &slot);
        }
        result
    }

    pub fn get(&self, path: &str) -> Option<Arc<StreamHub>> {
        self.lock().get(path).and_then(|slot| slot.get().cloned())
    }

    /// Number of hubs created so far.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    async fn create(&self, path: &str) -> Result<Arc<StreamHub>> {
        let source = LineSource::open(path).await?;
        let hub = Arc::new(StreamHub::new(source, self.settings.clone()));
        hub.start_following().await?;

        tracing::info!(path = %path, "created stream hub");
        Ok(hub)
    }

    fn forget_empty(&self, path: &str, slot: &HubSlot) {
        let mut hubs = self.lock();
        if let Some(current) = hubs.get(path)
            && Arc::ptr_eq(current, slot)
            && !current.initialized()
        {
            hubs.remove(path);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HubSlot>> {
        self.hubs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
