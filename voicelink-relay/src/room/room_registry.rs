use crate::error::RelayError;
use crate::room::{Occupant, RelayRoom};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use voicelink_core::{Role, RoomId, SignalMessage};

/// All live rooms, shared by every socket task.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RelayRoom>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a caller.
    ///
    /// Without an id a new room is created. With the id of a live room the
    /// caller slot is taken over, so a reconnecting caller keeps its room.
    /// The caller always gets `roomCreated`, plus `calleeReconnected` when a
    /// callee is already waiting.
    pub fn attach_caller(
        &self,
        requested: Option<RoomId>,
        occupant: Occupant,
    ) -> Result<RoomId, RelayError> {
        let Some(id) = requested else {
            let id = self.create_room(occupant.clone());
            occupant.send(&SignalMessage::RoomCreated(id.clone()));
            info!("Room {} created", id);
            return Ok(id);
        };

        let mut room = self
            .rooms
            .get_mut(&id)
            .ok_or_else(|| RelayError::RoomNotFound(id.clone()))?;

        if let Some(replaced) = room.attach(Role::Caller, occupant.clone()) {
            debug!("Caller of {} replaced a stale connection", id);
            replaced.close();
        }

        occupant.send(&SignalMessage::RoomCreated(id.clone()));
        if room.occupant(Role::Callee).is_some() {
            occupant.send(&SignalMessage::CalleeReconnected(Some(id.clone())));
        }
        info!("Caller re-attached to room {}", id);
        Ok(id)
    }

    /// Attaches a callee to an existing room and tells the caller about it.
    pub fn attach_callee(
        &self,
        requested: Option<RoomId>,
        occupant: Occupant,
    ) -> Result<RoomId, RelayError> {
        let id = requested.ok_or(RelayError::MissingRoomId)?;
        let mut room = self
            .rooms
            .get_mut(&id)
            .ok_or_else(|| RelayError::RoomNotFound(id.clone()))?;

        let reconnect = room.callee_seen();
        if let Some(replaced) = room.attach(Role::Callee, occupant) {
            debug!("Callee of {} replaced a stale connection", id);
            replaced.close();
        }

        if let Some(caller) = room.occupant(Role::Caller) {
            let msg = if reconnect {
                SignalMessage::CalleeReconnected(Some(id.clone()))
            } else {
                SignalMessage::CalleeJoined(Some(id.clone()))
            };
            caller.send(&msg);
        }
        info!(reconnect, "Callee attached to room {}", id);
        Ok(id)
    }

    /// Sends a frame from `from` to the other side of the room, if present.
    pub fn forward(&self, id: &RoomId, from: Role, text: String) -> bool {
        let Some(room) = self.rooms.get(id) else {
            return false;
        };
        match room.peer_of(from) {
            Some(peer) => peer.forward(text),
            None => {
                debug!("No peer for {} in {}, dropping frame", from, id);
                false
            }
        }
    }

    /// Frees the slot held by `connection_id` and drops the room once it is
    /// empty.
    pub fn release(&self, id: &RoomId, role: Role, connection_id: Uuid) {
        let released = match self.rooms.get_mut(id) {
            Some(mut room) => room.release(role, connection_id),
            None => false,
        };

        if released {
            debug!("{} left room {}", role, id);
            if self.rooms.remove_if(id, |_, room| room.is_empty()).is_some() {
                info!("Room {} deleted", id);
            }
        }
    }

    /// Tells everyone the relay is going away.
    pub fn close_all(&self) {
        for room in self.rooms.iter() {
            for occupant in room.occupants() {
                occupant.send(&SignalMessage::RoomClosed);
                occupant.close();
            }
        }
        self.rooms.clear();
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn create_room(&self, caller: Occupant) -> RoomId {
        loop {
            let id = RoomId::generate();
            if let Entry::Vacant(entry) = self.rooms.entry(id.clone()) {
                let mut room = RelayRoom::new(id.clone());
                room.attach(Role::Caller, caller);
                entry.insert(room);
                return id;
            }
        }
    }
}
