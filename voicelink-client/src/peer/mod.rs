mod peer_event;
mod peer_session;

pub use peer_event::{PeerEvent, PeerEventKind, PeerEventSender};
pub use peer_session::{PeerSession, PeerSessionFactory};
