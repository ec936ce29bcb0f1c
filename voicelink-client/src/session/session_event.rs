use std::time::Duration;
use voicelink_core::{ConnectionStatus, PeerConnectionState, RoomId};

/// What the session reports to the user interface.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged(ConnectionStatus),
    RoomAssigned(RoomId),
    Notice(String),
    Error(String),
    Reconnecting { attempt: u32, delay: Duration },
    PeerConnection(PeerConnectionState),
    RemoteTrack { kind: String },
    /// The session is back to idle after a leave.
    Left,
}
