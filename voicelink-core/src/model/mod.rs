mod ice_candidate;
mod room;
mod session_description;
mod signaling;
mod state;

pub use ice_candidate::IceCandidate;
pub use room::{Role, Room, RoomId};
pub use session_description::{SdpType, SessionDescription};
pub use signaling::{IceServerConfig, SignalMessage, WireFrame};
pub use state::{ConnectionStatus, IceConnectionState, NegotiationState, PeerConnectionState};
