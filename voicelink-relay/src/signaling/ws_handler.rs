use crate::room::{Occupant, RelayFrame, RoomRegistry};
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use voicelink_core::{Role, RoomId, SignalMessage, WireFrame};

#[derive(Debug, Default, Deserialize)]
pub struct RoomQuery {
    #[serde(rename = "roomID", default)]
    pub room_id: Option<String>,
}

impl RoomQuery {
    /// Blank ids count as missing.
    pub fn requested(&self) -> Option<RoomId> {
        self.room_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RoomId::from)
    }
}

pub async fn caller_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<RoomQuery>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    let requested = query.requested();
    ws.on_upgrade(move |socket| handle_socket(socket, Role::Caller, requested, registry))
}

pub async fn callee_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<RoomQuery>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    let requested = query.requested();
    ws.on_upgrade(move |socket| handle_socket(socket, Role::Callee, requested, registry))
}

async fn handle_socket(
    socket: WebSocket,
    role: Role,
    requested: Option<RoomId>,
    registry: RoomRegistry,
) {
    info!("New {} connection (room {:?})", role, requested);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let occupant = Occupant::new(tx);
    let connection_id = occupant.connection_id();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                RelayFrame::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                RelayFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let attached = match role {
        Role::Caller => registry.attach_caller(requested, occupant.clone()),
        Role::Callee => registry.attach_callee(requested, occupant.clone()),
    };
    let room_id = match attached {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting {} connection: {}", role, e);
            occupant.send(&SignalMessage::RoomNotFound);
            occupant.close();
            let _ = send_task.await;
            return;
        }
    };
    drop(occupant);

    let mut recv_task = tokio::spawn({
        let registry = registry.clone();
        let room_id = room_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match WireFrame::parse(text.as_str()) {
                        Ok(frame) => {
                            debug!("Forwarding {} from {} in {}", frame.kind, role, room_id);
                            registry.forward(&room_id, role, text.as_str().to_owned());
                        }
                        Err(e) => warn!("Dropping malformed frame from {}: {}", role, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.release(&room_id, role, connection_id);
    info!("{} disconnected from room {}", role, room_id);
}
