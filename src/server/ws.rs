//! WebSocket streaming endpoint
//!
//! Each connection becomes one viewer of the requested file. Frames queued by
//! the hub are written by a dedicated writer task; the connection task reads
//! control messages until the client goes away. The hub's sink holds the only
//! strong sender, so a viewer dropped by the hub closes its connection.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::AppState;
use super::handlers::FileQuery;
use crate::frame::MetaRecord;
use crate::viewer::ChannelSink;

/// Control messages a viewer may send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    /// `LOAD_MORE` asks for the current total,
    /// `LOAD_MORE:<offset>:<limit>` also for that window as historical frames
    LoadMore { window: Option<(i64, i64)> },
}

pub(crate) fn parse_control(text: &str) -> Option<Control> {
    let text = text.trim();
    if text == "LOAD_MORE" {
        return Some(Control::LoadMore { window: None });
    }

    let (offset, limit) = text.strip_prefix("LOAD_MORE:")?.split_once(':')?;
    let window = (offset.trim().parse().ok()?, limit.trim().parse().ok()?);
    Some(Control::LoadMore {
        window: Some(window),
    })
}

/// GET /ws?file=<path>
pub async fn websocket(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(file) = query.file().map(str::to_string) else {
        return (StatusCode::BAD_REQUEST, "file parameter required").into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    tracing::info!(path = %file, "websocket request");
    ws.on_upgrade(move |socket| handle_socket(state, file, socket))
}

async fn handle_socket(state: AppState, path: String, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(state.config.stream.viewer_buffer.max(1));

    let replies = tx.downgrade();
    let sink = Arc::new(ChannelSink::new(tx));
    let handle = match state.service.open_viewer(&path, sink).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "cannot stream file");
            let _ = sender.send(Message::Text(format!("Error: {}", e).into())).await;
            let _ = sender.close().await;
            return;
        }
    };
    tracing::info!(path = %path, viewer = %handle.id, "client connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match parse_control(text.as_str()) {
                Some(control) => {
                    if !answer_control(&state, &path, control, &replies).await {
                        break;
                    }
                }
                None => tracing::debug!(path = %path, text = %text.as_str(), "ignoring unknown message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "websocket receive failed");
                break;
            }
        }
    }

    state.service.close_viewer(&path, handle.id).await;
    writer.abort();
    tracing::info!(path = %path, viewer = %handle.id, "client disconnected");
}

/// Replies to a control message. Returns false once the writer is gone.
async fn answer_control(
    state: &AppState,
    path: &str,
    control: Control,
    replies: &mpsc::WeakSender<String>,
) -> bool {
    let Some(tx) = replies.upgrade() else {
        return false;
    };
    let Control::LoadMore { window } = control;
    let framing = &state.service.settings().framing;
    let (offset, limit) = window.unwrap_or((0, 0));

    let page = match state.service.get_page(path, offset, limit).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "load more failed");
            return true;
        }
    };

    for line in &page.lines {
        if tx.send(framing.historical(line)).await.is_err() {
            return false;
        }
    }
    tx.send(framing.meta(MetaRecord::LoadMoreResponse { total: page.total }))
        .await
        .is_ok()
}
