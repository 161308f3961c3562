//! A live log viewer that streams file contents to browsers.
//!
//! Each viewer of a file first receives a snapshot of the file's most recent
//! lines, then every line appended afterwards. One follow task per file feeds
//! all of its viewers; older lines are served on demand as stateless windows.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use loged::{ChannelSink, LogService, StreamSettings};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = LogService::new(StreamSettings::default());
//!
//!     let (tx, mut rx) = mpsc::channel(1024);
//!     let handle = service.open_viewer("app.log", Arc::new(ChannelSink::new(tx))).await?;
//!
//!     while let Some(frame) = rx.recv().await {
//!         println!("{}", frame);
//!     }
//!
//!     service.close_viewer("app.log", handle.id).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod server;

// Internal modules - exposed through the re-exports below
mod error;
mod frame;
mod hub;
mod page;
mod reader;
mod registry;
mod service;
mod stream;
mod viewer;
mod watcher;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::Config;
pub use error::{Error, Result};
pub use frame::{DEFAULT_HISTORICAL_PREFIX, DEFAULT_META_PREFIX, Framing, MetaRecord};
pub use hub::{DEFAULT_POLL_INTERVAL, DEFAULT_SNAPSHOT_LINES, HubState, StreamHub, StreamSettings};
pub use page::{LineWindow, read_window};
pub use reader::LineSource;
pub use registry::HubRegistry;
pub use service::{LogService, ViewerHandle};
pub use stream::FollowStream;
pub use viewer::{ChannelSink, ViewerId, ViewerSink};
