use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct RoomId(pub String);

impl RoomId {
    /// Fresh relay-assigned id, always prefixed with `room-`.
    pub fn generate() -> Self {
        Self(format!("room-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Caller,
    Callee,
}

impl Role {
    /// Path segment of the relay endpoint for this role.
    pub fn endpoint(self) -> &'static str {
        match self {
            Role::Caller => "caller",
            Role::Callee => "callee",
        }
    }

    /// Empty id requests a new room, anything else joins an existing one.
    pub fn for_join(room_id: &str) -> Self {
        if room_id.trim().is_empty() {
            Role::Caller
        } else {
            Role::Callee
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Room membership of one session.
///
/// The role never changes. A callee knows its id from the start; a caller
/// learns it exactly once, from the relay's `roomCreated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    role: Role,
    id: Option<RoomId>,
}

impl Room {
    pub fn for_join(room_id: &str) -> Self {
        let role = Role::for_join(room_id);
        let id = match role {
            Role::Caller => None,
            Role::Callee => Some(RoomId::from(room_id.trim())),
        };
        Self { role, id }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn id(&self) -> Option<&RoomId> {
        self.id.as_ref()
    }

    /// Records the relay-assigned id. Returns `false` when a different id
    /// was already recorded; the first one wins.
    pub fn assign_id(&mut self, id: RoomId) -> bool {
        match &self.id {
            Some(existing) => *existing == id,
            None => {
                self.id = Some(id);
                true
            }
        }
    }
}
