//! The realtime connection endpoint: one session per upgraded socket.

use axum::{
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{CloseFrame, Message as WsMessage, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::error::JoinError;
use crate::core::message::{BrokerEnvelope, ConnectionId, Message, RoomId, User};
use crate::core::registry::Member;

use super::app::AppState;
use super::messages::OutboundFrame;

/// Policy-violation close code sent when a full room turns a connection away.
const ROOM_FULL_CLOSE: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    #[serde(default)]
    pub token: String,
}

/// `GET /rooms/{room_id}/socket?token=...`
///
/// The token is resolved before the upgrade is accepted, so an
/// unauthenticated peer never sees a successful handshake. The path room
/// must match the user's assigned room; delivery always targets the
/// assigned room, never a client-chosen one.
pub async fn room_socket(
    Path(room_id): Path<u64>,
    Query(query): Query<SocketQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let user = match state.directory.resolve(&query.token) {
        Ok(user) => user.clone(),
        Err(err) => {
            debug!(room=%room_id, error=%err, "socket rejected before upgrade");
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    };

    if user.room_id != RoomId(room_id) {
        debug!(room=%room_id, user=%user.id, assigned=%user.room_id, "socket rejected, room mismatch");
        return (StatusCode::FORBIDDEN, "not your room").into_response();
    }

    ws.on_upgrade(move |socket| run_session(socket, state, user))
}

/// One connection session: join the room, then run the read and write loops
/// until the socket closes. Leave is idempotent, so every exit path may call
/// it.
async fn run_session(socket: WebSocket, state: AppState, user: User) {
    let connection_id = ConnectionId::new();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(state.outbound_capacity);

    let member = Member { connection_id, user_id: user.id, outbound: outbound_tx.clone() };

    let (mut sink, mut stream) = socket.split();

    if let Err(JoinError::RoomFull(room)) = state.registry.join(user.room_id, member) {
        info!(room=%room, user=%user.id, "join rejected, room full");
        let _ = sink
            .send(WsMessage::Close(Some(CloseFrame {
                code: ROOM_FULL_CLOSE,
                reason: "room full".into(),
            })))
            .await;
        return;
    }

    info!(room=%user.room_id, user=%user.id, connection=%connection_id, "connection open");

    // Write loop: drain the outbound channel the dispatcher feeds and push
    // frames to the client.
    let mut write_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let frame = match serde_json::to_string(&OutboundFrame::from(message)) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error=%err, "failed to encode outbound frame");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Read loop: client input becomes a message targeted at the user's own
    // room. The local echo goes straight to this connection's outbound
    // channel; the dispatcher skips the origin on fan-out, so the sender
    // sees its message exactly once.
    loop {
        tokio::select! {
            _ = &mut write_task => break,
            maybe_frame = stream.next() => {
                match maybe_frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        let message = Message {
                            content: text.to_string(),
                            target_room_id: user.room_id,
                            sender_id: user.id,
                            sender_name: user.username.clone(),
                        };
                        let _ = outbound_tx.try_send(message.clone());
                        let envelope = BrokerEnvelope::new(message, Some(connection_id));
                        if state.broker.publish(envelope).await.is_err() {
                            warn!(connection=%connection_id, "broker unavailable, closing session");
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {} // pings answered by axum, binary ignored
                    Some(Err(err)) => {
                        debug!(connection=%connection_id, error=%err, "socket error");
                        break;
                    }
                }
            }
        }
    }

    state.registry.leave(user.room_id, connection_id);
    write_task.abort();
    info!(room=%user.room_id, user=%user.id, connection=%connection_id, "connection closed");
}
