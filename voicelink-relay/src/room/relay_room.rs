use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;
use voicelink_core::{Role, RoomId, SignalMessage};

/// What the registry asks a socket task to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    Text(String),
    Close,
}

/// One attached WebSocket connection.
#[derive(Debug, Clone)]
pub struct Occupant {
    connection_id: Uuid,
    tx: mpsc::UnboundedSender<RelayFrame>,
}

impl Occupant {
    pub fn new(tx: mpsc::UnboundedSender<RelayFrame>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn send(&self, msg: &SignalMessage) -> bool {
        match msg.encode() {
            Ok(text) => self.forward(text),
            Err(e) => {
                error!("Failed to encode {}: {}", msg.tag(), e);
                false
            }
        }
    }

    /// Passes a frame through untouched.
    pub fn forward(&self, text: String) -> bool {
        self.tx.send(RelayFrame::Text(text)).is_ok()
    }

    pub fn close(&self) {
        let _ = self.tx.send(RelayFrame::Close);
    }
}

/// A room with one slot per role.
#[derive(Debug)]
pub struct RelayRoom {
    id: RoomId,
    caller: Option<Occupant>,
    callee: Option<Occupant>,
    /// A callee was attached at some point, so the next one is a reconnect.
    callee_seen: bool,
}

impl RelayRoom {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            caller: None,
            callee: None,
            callee_seen: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn occupant(&self, role: Role) -> Option<&Occupant> {
        match role {
            Role::Caller => self.caller.as_ref(),
            Role::Callee => self.callee.as_ref(),
        }
    }

    pub fn peer_of(&self, role: Role) -> Option<&Occupant> {
        match role {
            Role::Caller => self.callee.as_ref(),
            Role::Callee => self.caller.as_ref(),
        }
    }

    /// Puts `occupant` into the slot for `role` and returns whoever held it.
    pub fn attach(&mut self, role: Role, occupant: Occupant) -> Option<Occupant> {
        let slot = match role {
            Role::Caller => &mut self.caller,
            Role::Callee => {
                self.callee_seen = true;
                &mut self.callee
            }
        };
        slot.replace(occupant)
    }

    pub fn callee_seen(&self) -> bool {
        self.callee_seen
    }

    /// Frees the slot, but only for the connection that holds it.
    pub fn release(&mut self, role: Role, connection_id: Uuid) -> bool {
        let slot = match role {
            Role::Caller => &mut self.caller,
            Role::Callee => &mut self.callee,
        };
        if slot.as_ref().map(Occupant::connection_id) == Some(connection_id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.caller.is_none() && self.callee.is_none()
    }

    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.caller.iter().chain(self.callee.iter())
    }
}
