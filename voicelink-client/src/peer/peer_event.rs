use tokio::sync::mpsc;
use voicelink_core::{IceCandidate, IceConnectionState, PeerConnectionState};

/// Events a peer session generates for the session loop.
///
/// `epoch` is the negotiation epoch the session was created in. Events
/// from a torn-down session still arrive for a while and are filtered by it.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerEvent {
    pub epoch: u64,
    pub kind: PeerEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEventKind {
    /// A local candidate was gathered. `None` means gathering finished.
    LocalCandidate(Option<IceCandidate>),

    IceConnectionState(IceConnectionState),

    ConnectionState(PeerConnectionState),

    /// Remote media arrived. Playback is up to the embedding application.
    RemoteTrack { kind: String, track_id: String },

    /// The microphone could not be opened; the session continues
    /// receive-only.
    MediaUnavailable(String),
}

#[derive(Debug, Clone)]
pub struct PeerEventSender {
    epoch: u64,
    tx: mpsc::Sender<PeerEvent>,
}

impl PeerEventSender {
    pub fn new(epoch: u64, tx: mpsc::Sender<PeerEvent>) -> Self {
        Self { epoch, tx }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub async fn emit(&self, kind: PeerEventKind) {
        let event = PeerEvent {
            epoch: self.epoch,
            kind,
        };
        let _ = self.tx.send(event).await;
    }
}
