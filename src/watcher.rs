//! Filesystem notifications used to wake the follow loop.

use crate::error::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Watches the directory containing a followed file.
pub(crate) struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_path: PathBuf,
}

impl FileWatcher {
    pub(crate) fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
            file_path,
        })
    }

    /// Starts watching the parent directory so removals are reported too.
    pub(crate) fn start_watching(&mut self) -> Result<()> {
        let watch_path = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    pub(crate) async fn next_event(&mut self) -> Option<notify::Result<Event>> {
        self.receiver.recv().await
    }

    pub(crate) fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Check if a notify event is relevant to a specific file
pub(crate) fn is_event_relevant_to_file(event: &Event, target_file_name: &str) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy() == target_file_name)
            .unwrap_or(false)
    })
}

pub(crate) fn is_removal(event: &Event) -> bool {
    matches!(event.kind, EventKind::Remove(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, ModifyKind, RemoveKind};

    fn modify_event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            paths,
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_file_name_of_nested_path() {
        let watcher = FileWatcher::new("/var/log/app/test.log").unwrap();
        assert_eq!(watcher.file_name(), "test.log");
    }

    #[test]
    fn test_is_event_relevant_to_file_exact_match() {
        let event = modify_event(vec![PathBuf::from("/tmp/test.log")]);

        assert!(is_event_relevant_to_file(&event, "test.log"));
        assert!(!is_event_relevant_to_file(&event, "other.log"));
    }

    #[test]
    fn test_is_event_relevant_to_file_multiple_paths() {
        let event = modify_event(vec![
            PathBuf::from("/tmp/other.log"),
            PathBuf::from("/tmp/test.log"),
        ]);

        assert!(is_event_relevant_to_file(&event, "test.log"));
        assert!(is_event_relevant_to_file(&event, "other.log"));
        assert!(!is_event_relevant_to_file(&event, "missing.log"));
    }

    #[test]
    fn test_is_event_relevant_to_file_case_sensitivity() {
        let event = modify_event(vec![PathBuf::from("/tmp/Test.Log")]);

        assert!(!is_event_relevant_to_file(&event, "test.log"));
        assert!(is_event_relevant_to_file(&event, "Test.Log"));
    }

    #[test]
    fn test_is_event_relevant_to_file_empty_paths() {
        let event = modify_event(vec![]);
        assert!(!is_event_relevant_to_file(&event, "test.log"));
    }

    #[test]
    fn test_is_removal() {
        let removed = Event {
            kind: EventKind::Remove(RemoveKind::File),
            paths: vec![PathBuf::from("/tmp/test.log")],
            attrs: Default::default(),
        };
        let modified = modify_event(vec![PathBuf::from("/tmp/test.log")]);

        assert!(is_removal(&removed));
        assert!(!is_removal(&modified));
    }

    #[tokio::test]
    async fn test_watching_relative_file_without_parent() {
        let mut watcher = FileWatcher::new("test.log").unwrap();
        assert!(watcher.start_watching().is_ok());
    }

    #[tokio::test]
    async fn test_next_event_times_out_when_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FileWatcher::new(dir.path().join("idle.log")).unwrap();
        watcher.start_watching().unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            watcher.next_event(),
        )
        .await;

        assert!(result.is_err());
    }
}
