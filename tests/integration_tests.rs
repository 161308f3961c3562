use loged::{ChannelSink, Error, HubState, LogService, StreamSettings};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const POLL: Duration = Duration::from_millis(20);

fn service() -> LogService {
    LogService::new(StreamSettings {
        poll_interval: POLL,
        ..StreamSettings::default()
    })
}

fn write_log(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("app.log");
    std::fs::write(&path, content).unwrap();
    path
}

fn append(path: &Path, content: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
}

/// Helper function to collect exactly `count` frames, failing after `timeout`
async fn collect_frames(
    rx: &mut mpsc::Receiver<String>,
    count: usize,
    timeout: Duration,
) -> Vec<String> {
    let mut frames = Vec::new();
    let timeout_future = tokio::time::sleep(timeout);
    tokio::pin!(timeout_future);

    while frames.len() < count {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(frame) => frames.push(frame),
                    None => break,
                }
            }
            _ = &mut timeout_future => break,
        }
    }

    frames
}

fn viewer() -> (Arc<ChannelSink>, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(1024);
    (Arc::new(ChannelSink::new(tx)), rx)
}

#[tokio::test]
async fn test_snapshot_then_live_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "a\nb\nc\n");
    let path_str = path.display().to_string();
    let service = service();

    let (sink, mut rx) = viewer();
    let handle = service.open_viewer(&path_str, sink).await.unwrap();

    let frames = collect_frames(&mut rx, 4, Duration::from_secs(5)).await;
    assert_eq!(frames, vec!["a", "b", "c", "__META__:INITIAL_LOAD:3:3"]);

    // Give the follow task time to reach end of file
    tokio::time::sleep(POLL * 5).await;
    append(&path, "d\n");

    let frames = collect_frames(&mut rx, 1, Duration::from_secs(5)).await;
    assert_eq!(frames, vec!["d"]);

    assert!(service.close_viewer(&path_str, handle.id).await);
}

#[tokio::test]
async fn test_two_viewers_share_one_hub() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "first\n");
    let path_str = path.display().to_string();
    let service = service();

    let (sink_a, mut rx_a) = viewer();
    let (sink_b, mut rx_b) = viewer();
    let a = service.open_viewer(&path_str, sink_a).await.unwrap();
    let b = service.open_viewer(&path_str, sink_b).await.unwrap();

    assert!(Arc::ptr_eq(&a.hub, &b.hub));
    assert_eq!(service.registry().len(), 1);

    assert_eq!(collect_frames(&mut rx_a, 2, Duration::from_secs(5)).await.len(), 2);
    assert_eq!(collect_frames(&mut rx_b, 2, Duration::from_secs(5)).await.len(), 2);

    tokio::time::sleep(POLL * 5).await;
    append(&path, "x\ny\n");

    assert_eq!(
        collect_frames(&mut rx_a, 2, Duration::from_secs(5)).await,
        vec!["x", "y"]
    );
    assert_eq!(
        collect_frames(&mut rx_b, 2, Duration::from_secs(5)).await,
        vec!["x", "y"]
    );
}

#[tokio::test]
async fn test_closed_viewer_stops_receiving() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "a\n");
    let path_str = path.display().to_string();
    let service = service();

    let (sink, mut rx) = viewer();
    let handle = service.open_viewer(&path_str, sink).await.unwrap();
    collect_frames(&mut rx, 2, Duration::from_secs(5)).await;

    assert!(service.close_viewer(&path_str, handle.id).await);
    tokio::time::sleep(POLL * 5).await;
    append(&path, "after close\n");

    let frames = collect_frames(&mut rx, 1, POLL * 10).await;
    assert!(frames.is_empty(), "unexpected frames: {:?}", frames);
}

#[tokio::test]
async fn test_long_file_snapshot_is_tail() {
    let dir = tempfile::tempdir().unwrap();
    let content: String = (0..250).map(|i| format!("line {}\n", i)).collect();
    let path = write_log(dir.path(), &content);
    let service = service();

    let (sink, mut rx) = viewer();
    service
        .open_viewer(&path.display().to_string(), sink)
        .await
        .unwrap();

    let frames = collect_frames(&mut rx, 201, Duration::from_secs(5)).await;
    assert_eq!(frames[0], "line 50");
    assert_eq!(frames[199], "line 249");
    assert_eq!(frames[200], "__META__:INITIAL_LOAD:250:200");
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let service = service();
    let (sink, _rx) = viewer();

    let result = service
        .open_viewer("definitely_nonexistent_file_12345.log", sink)
        .await;

    assert!(matches!(result, Err(Error::NotFound { .. })));
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_page_of_historical_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "a\nb\nc\n");
    let service = service();

    let page = service
        .get_page(&path.display().to_string(), 1, 1)
        .await
        .unwrap();

    assert_eq!(page.lines, vec!["b"]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_deleted_file_terminates_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "a\n");
    let service = service();

    let (sink, mut rx) = viewer();
    let handle = service
        .open_viewer(&path.display().to_string(), sink)
        .await
        .unwrap();
    collect_frames(&mut rx, 2, Duration::from_secs(5)).await;

    let mut state = handle.hub.subscribe_state();
    std::fs::remove_file(&path).unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == HubState::SourceTerminated),
    )
    .await
    .unwrap()
    .unwrap();

    // The viewer stays registered and gets no error frame
    assert_eq!(handle.hub.viewer_count().await, 1);
    assert!(collect_frames(&mut rx, 1, POLL * 5).await.is_empty());
}
