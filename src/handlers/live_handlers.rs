//! WebSocket endpoint for live dashboards.
//!
//! A viewer is registered for the lifetime of its socket and receives the
//! text frame `update` after every accepted write. It is unregistered on
//! close, on a receive error, or as soon as a send fails.

use crate::{
    AppState,
    services::broadcaster::{Broadcaster, PULSE_TEXT},
};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::debug;

/// WS `/ws`
pub async fn live_updates(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| serve_viewer(socket, broadcaster))
}

async fn serve_viewer(socket: WebSocket, broadcaster: Broadcaster) {
    let (viewer_id, mut pulses) = broadcaster.register();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            pulse = pulses.recv() => {
                let Some(_) = pulse else { break };
                if let Err(err) = sender.send(Message::Text(PULSE_TEXT.into())).await {
                    debug!(viewer_id = %viewer_id, error = %err, "pulse send failed");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                // Viewers only listen; anything they send is ignored.
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(viewer_id = %viewer_id, error = %err, "viewer socket error");
                    break;
                }
            },
        }
    }

    broadcaster.unregister(viewer_id);
}
