//! WebSocket Endpoint - Real-time Client Connections
//!
//! Upgrades `/ws`, registers the connection with the hub, then runs a
//! single task per connection that drains the hub's outbound queue
//! into the socket and handles the small inbound control protocol.
//! Any socket error tears the connection down and removes it from the
//! hub registry.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::domain::events::ClientCommand;

use super::routes::AppState;

/// GET /ws upgrade entry point.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let hub = state.engine.hub().clone();
    let (id, mut outbound) = hub.register();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            // Push broadcast events queued by the hub
            queued = outbound.recv() => {
                let Some(payload) = queued else {
                    // Hub pruned this connection (slow or stale)
                    break;
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            // Handle incoming control messages
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(ClientCommand::Subscribe { markets }) => {
                                let Some(reply) = hub.set_subscriptions(id, markets) else {
                                    break;
                                };
                                match serde_json::to_string(&reply) {
                                    Ok(json) => {
                                        if sink.send(Message::Text(json)).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => warn!(error = %e, "failed to serialize ack"),
                                }
                            }
                            Err(e) => {
                                // Malformed control messages are logged
                                // and ignored, never fatal
                                warn!(connection = %id, error = %e, "WebSocket message error");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by axum
                    Some(Err(e)) => {
                        debug!(connection = %id, error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    hub.remove(id);
}
