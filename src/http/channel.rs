//! Bi-directional session channel.
//!
//! One logical real-time connection per client session, upgraded at
//! `/sockjs`. The server pushes a `connected` payload, the current device
//! state, and every event-bus event; the client sends throttle hints and
//! commands.
//!
//! # Design Decisions
//! - A lagging client drops events rather than stalling the bus
//! - Connection failures close the socket; there is no reconnect logic on
//!   the server side

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;

use crate::context::{AppContext, VERSION};
use crate::managers::Event;
use crate::observability::metrics;

/// Complete the WebSocket upgrade and run the connection.
pub fn upgrade(ws: WebSocketUpgrade, ctx: Arc<AppContext>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, ctx))
}

async fn handle_connection(socket: WebSocket, ctx: Arc<AppContext>) {
    metrics::channel_connections(1);
    if let Err(e) = run_connection(socket, &ctx).await {
        tracing::debug!(error = %e, "Push channel closed with error");
    }
    metrics::channel_connections(-1);
}

async fn run_connection(socket: WebSocket, ctx: &AppContext) -> Result<(), axum::Error> {
    let (mut sink, mut stream) = socket.split();

    sink.send(Message::Text(
        json!({
            "connected": {
                "version": VERSION,
                "display_version": VERSION,
            }
        })
        .to_string()
        .into(),
    ))
    .await?;

    sink.send(Message::Text(
        json!({ "current": ctx.device.state_payload() })
            .to_string()
            .into(),
    ))
    .await?;

    let mut events = ctx.events.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        sink.send(Message::Text(event_payload(&event).to_string().into())).await?;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Push channel lagged, events dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_client_message(&text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e),
                }
            }
        }
    }

    Ok(())
}

fn event_payload(event: &Event) -> serde_json::Value {
    json!({ "event": event })
}

fn handle_client_message(text: &str) {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(message) => {
            if let Some(throttle) = message.get("throttle") {
                tracing::debug!(%throttle, "Client adjusted push throttle");
            } else {
                tracing::debug!(%message, "Unhandled channel message");
            }
        }
        Err(_) => tracing::debug!("Non-JSON channel message ignored"),
    }
}
