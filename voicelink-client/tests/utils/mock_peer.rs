use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use voicelink_client::{PeerError, PeerEventKind, PeerEventSender, PeerSession, PeerSessionFactory};
use voicelink_core::{IceCandidate, NegotiationState, SdpType, SessionDescription};

/// Offer SDP with video before audio, the way a browser orders it when the
/// camera transceiver was added first.
pub const MOCK_OFFER_SDP: &str = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\na=mid:0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:1\r\n";
pub const MOCK_ANSWER_SDP: &str = "v=0\r\no=- 2 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:0\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signaling {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
}

#[derive(Debug, Default)]
struct MockState {
    signaling: Option<Signaling>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    applied: Vec<IceCandidate>,
    rollbacks: u32,
    closed: bool,
    fail_rollback: bool,
    reject_answers: bool,
}

/// PeerSession that follows the signaling state rules of a real peer
/// connection without touching the network.
pub struct MockPeerSession {
    pub index: usize,
    events: PeerEventSender,
    state: Mutex<MockState>,
}

impl MockPeerSession {
    fn new(index: usize, events: PeerEventSender, fail_rollback: bool) -> Self {
        Self {
            index,
            events,
            state: Mutex::new(MockState {
                signaling: Some(Signaling::Stable),
                fail_rollback,
                ..Default::default()
            }),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.events.epoch()
    }

    /// Simulates transport feedback from this session.
    pub async fn emit(&self, kind: PeerEventKind) {
        self.events.emit(kind).await;
    }

    pub async fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().await.applied.clone()
    }

    pub async fn rollbacks(&self) -> u32 {
        self.state.lock().await.rollbacks
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    pub async fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().await.local.clone()
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().await.remote.clone()
    }

    /// Makes remote answers fail the content check.
    pub async fn reject_answers(&self) {
        self.state.lock().await.reject_answers = true;
    }

    fn invalid(what: &str, state: Option<Signaling>) -> PeerError {
        PeerError::InvalidState(format!("{what} in {state:?}"))
    }
}

#[async_trait]
impl PeerSession for MockPeerSession {
    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(PeerError::Closed);
        }
        Ok(SessionDescription::offer(MOCK_OFFER_SDP))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(PeerError::Closed);
        }
        if state.signaling != Some(Signaling::HaveRemoteOffer) {
            return Err(Self::invalid("create_answer", state.signaling));
        }
        Ok(SessionDescription::answer(MOCK_ANSWER_SDP))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(PeerError::Closed);
        }
        let next = match (desc.kind, state.signaling) {
            (SdpType::Offer, Some(Signaling::Stable)) => Signaling::HaveLocalOffer,
            (SdpType::Answer, Some(Signaling::HaveRemoteOffer)) => Signaling::Stable,
            (_, current) => return Err(Self::invalid("set_local_description", current)),
        };
        state.signaling = Some(next);
        state.local = Some(desc);
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(PeerError::Closed);
        }
        let next = match (desc.kind, state.signaling) {
            (SdpType::Offer, Some(Signaling::Stable)) => Signaling::HaveRemoteOffer,
            (SdpType::Answer, Some(Signaling::HaveLocalOffer)) if state.reject_answers => {
                // Like webrtc-rs: the transition happens before the content
                // check fails, leaving the session stable and unusable.
                state.signaling = Some(Signaling::Stable);
                state.remote = Some(desc);
                return Err(PeerError::Rejected(
                    "set_remote_description called with no ice-ufrag".to_owned(),
                ));
            }
            (SdpType::Answer, Some(Signaling::HaveLocalOffer)) => Signaling::Stable,
            (_, current) => return Err(Self::invalid("set_remote_description", current)),
        };
        state.signaling = Some(next);
        state.remote = Some(desc);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), PeerError> {
        let mut state = self.state.lock().await;
        if state.fail_rollback {
            return Err(PeerError::Rejected("rollback unsupported".to_owned()));
        }
        match state.signaling {
            Some(Signaling::HaveLocalOffer) => state.local = None,
            Some(Signaling::HaveRemoteOffer) => state.remote = None,
            current => return Err(Self::invalid("rollback", current)),
        }
        state.signaling = Some(Signaling::Stable);
        state.rollbacks += 1;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        let mut state = self.state.lock().await;
        if state.remote.is_none() {
            return Err(PeerError::InvalidState("no remote description".to_owned()));
        }
        if candidate.candidate.contains("invalid") {
            return Err(PeerError::Rejected(candidate.candidate));
        }
        state.applied.push(candidate);
        Ok(())
    }

    async fn negotiation_state(&self) -> NegotiationState {
        let state = self.state.lock().await;
        match state.signaling {
            Some(Signaling::HaveLocalOffer) => NegotiationState::HaveLocalOffer,
            Some(Signaling::HaveRemoteOffer) => NegotiationState::HaveRemoteOffer,
            _ if state.remote.is_some() => NegotiationState::Stable,
            _ => NegotiationState::Idle,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.state.lock().await.remote.is_some()
    }

    async fn close(&self) -> Result<(), PeerError> {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.signaling = None;
        Ok(())
    }
}

/// Factory that keeps every session it created for inspection.
#[derive(Clone, Default)]
pub struct MockPeerFactory {
    sessions: Arc<Mutex<Vec<Arc<MockPeerSession>>>>,
    fail_rollback: bool,
}

impl MockPeerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions created by this factory refuse to roll back.
    pub fn without_rollback() -> Self {
        Self {
            fail_rollback: true,
            ..Self::default()
        }
    }

    pub async fn created(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn session(&self, index: usize) -> Arc<MockPeerSession> {
        self.sessions.lock().await[index].clone()
    }

    pub async fn latest(&self) -> Option<Arc<MockPeerSession>> {
        self.sessions.lock().await.last().cloned()
    }
}

#[async_trait]
impl PeerSessionFactory for MockPeerFactory {
    async fn create(&self, events: PeerEventSender) -> Result<Arc<dyn PeerSession>, PeerError> {
        let mut sessions = self.sessions.lock().await;
        let session = Arc::new(MockPeerSession::new(
            sessions.len(),
            events,
            self.fail_rollback,
        ));
        sessions.push(session.clone());
        Ok(session as Arc<dyn PeerSession>)
    }
}
