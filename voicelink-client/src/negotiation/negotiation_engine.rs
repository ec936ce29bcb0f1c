use crate::error::{NegotiationError, PeerError};
use crate::negotiation::{CandidateBuffer, SignalingOutput};
use crate::peer::{PeerEvent, PeerEventKind, PeerEventSender, PeerSession, PeerSessionFactory};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use voicelink_core::sdp::{ice_ufrag, normalize_audio_first};
use voicelink_core::{
    IceCandidate, IceConnectionState, NegotiationState, SessionDescription, SignalMessage,
};

/// ICE-failure restarts in a row before the engine stops trying.
pub const MAX_ICE_RESTARTS: u32 = 3;

/// Why a negotiation is being started over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    InvalidRemoteState(String),
    IceFailed,
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartReason::InvalidRemoteState(reason) => {
                write!(f, "remote answer did not fit ({reason})")
            }
            RestartReason::IceFailed => f.write_str("ICE connection failed"),
        }
    }
}

/// Offer/answer state machine for one call.
///
/// Owns the current [`PeerSession`] and the candidates that arrived
/// before its remote description. Every new session starts a new epoch;
/// peer events carry the epoch they were produced in, and events from an
/// older epoch are ignored.
pub struct NegotiationEngine {
    factory: Arc<dyn PeerSessionFactory>,
    peer_tx: mpsc::Sender<PeerEvent>,
    session: Option<Arc<dyn PeerSession>>,
    epoch: u64,
    candidates: CandidateBuffer,
    /// Set while the current session was started from a local offer.
    offering: bool,
    restarts: u32,
    /// ICE-failure restarts since ICE last connected.
    ice_restarts: u32,
}

impl NegotiationEngine {
    pub fn new(factory: Arc<dyn PeerSessionFactory>, peer_tx: mpsc::Sender<PeerEvent>) -> Self {
        Self {
            factory,
            peer_tx,
            session: None,
            epoch: 0,
            candidates: CandidateBuffer::new(),
            offering: false,
            restarts: 0,
            ice_restarts: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn buffered_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub async fn state(&self) -> NegotiationState {
        match &self.session {
            Some(session) => session.negotiation_state().await,
            None => NegotiationState::Idle,
        }
    }

    pub fn is_current(&self, event: &PeerEvent) -> bool {
        self.session.is_some() && event.epoch == self.epoch
    }

    /// Starts a new round from a local offer on a fresh session.
    ///
    /// Whatever was negotiated before is dropped, including buffered
    /// candidates that belonged to it.
    pub async fn start_offer(&mut self, out: &dyn SignalingOutput) -> Result<(), NegotiationError> {
        self.candidates.clear();
        let session = self.fresh_session().await?;
        self.offering = true;

        let offer = session.create_offer().await?;
        let offer = SessionDescription::offer(normalize_audio_first(&offer.sdp));
        session.set_local_description(offer.clone()).await?;

        info!(epoch = self.epoch, "Local offer set, sending to peer");
        out.send_offer(offer).await;
        Ok(())
    }

    pub async fn restart(
        &mut self,
        reason: RestartReason,
        out: &dyn SignalingOutput,
    ) -> Result<(), NegotiationError> {
        self.restarts += 1;
        warn!(epoch = self.epoch, "Restarting negotiation: {}", reason);
        self.start_offer(out).await
    }

    /// Feeds one relay message into the state machine.
    pub async fn handle_signal(
        &mut self,
        msg: SignalMessage,
        out: &dyn SignalingOutput,
    ) -> Result<(), NegotiationError> {
        match msg {
            SignalMessage::CalleeJoined(_) | SignalMessage::CalleeReconnected(_) => {
                self.start_offer(out).await
            }
            SignalMessage::Offer(offer) => self.accept_offer(offer, out).await,
            SignalMessage::Answer(answer) => match self.apply_answer(answer).await {
                Err(NegotiationError::StaleAnswer(state)) => {
                    warn!("Ignoring answer received in state {:?}", state);
                    Ok(())
                }
                Err(NegotiationError::InvalidRemoteState(reason)) => {
                    self.restart(RestartReason::InvalidRemoteState(reason), out)
                        .await
                }
                other => other,
            },
            SignalMessage::IceCandidate(candidate) => {
                self.add_remote_candidate(candidate).await;
                Ok(())
            }
            other => {
                debug!("Negotiation ignores {}", other.tag());
                Ok(())
            }
        }
    }

    /// Handles transport feedback from the current session.
    pub async fn handle_peer_event(
        &mut self,
        event: PeerEvent,
        out: &dyn SignalingOutput,
    ) -> Result<(), NegotiationError> {
        if !self.is_current(&event) {
            debug!(
                event_epoch = event.epoch,
                epoch = self.epoch,
                "Ignoring event from a previous peer session"
            );
            return Ok(());
        }

        match event.kind {
            PeerEventKind::LocalCandidate(Some(candidate)) => {
                out.send_ice_candidate(candidate).await;
                Ok(())
            }
            PeerEventKind::LocalCandidate(None) => {
                debug!("Local candidate gathering complete");
                Ok(())
            }
            PeerEventKind::IceConnectionState(
                IceConnectionState::Connected | IceConnectionState::Completed,
            ) => {
                self.ice_restarts = 0;
                Ok(())
            }
            PeerEventKind::IceConnectionState(IceConnectionState::Failed) if self.offering => {
                if self.ice_restarts >= MAX_ICE_RESTARTS {
                    error!(
                        attempts = self.ice_restarts,
                        "ICE keeps failing, giving up on renegotiation"
                    );
                    return Err(NegotiationError::RestartsExhausted(self.ice_restarts));
                }
                self.ice_restarts += 1;
                self.restart(RestartReason::IceFailed, out).await
            }
            PeerEventKind::IceConnectionState(IceConnectionState::Failed) => {
                warn!("ICE failed, waiting for the caller to renegotiate");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Closes the session and forgets everything about the current call.
    pub async fn reset(&mut self) {
        self.close_session().await;
        self.candidates.clear();
        self.offering = false;
        self.ice_restarts = 0;
        // Events still in flight from the closed session must not match.
        self.epoch += 1;
    }

    async fn accept_offer(
        &mut self,
        offer: SessionDescription,
        out: &dyn SignalingOutput,
    ) -> Result<(), NegotiationError> {
        let session = self.session_for_offer().await?;
        self.offering = false;

        let ufrag = ice_ufrag(&offer.sdp).map(str::to_owned);
        session.set_remote_description(offer).await?;
        self.drain_candidates(&session, ufrag.as_deref()).await;

        let answer = session.create_answer().await?;
        session.set_local_description(answer.clone()).await?;

        info!(epoch = self.epoch, "Remote offer accepted, sending answer");
        out.send_answer(answer).await;
        Ok(())
    }

    /// Picks the session a remote offer is applied to.
    async fn session_for_offer(&mut self) -> Result<Arc<dyn PeerSession>, NegotiationError> {
        let Some(session) = self.session.clone() else {
            return self.fresh_session().await;
        };

        match session.negotiation_state().await {
            NegotiationState::Idle => Ok(session),
            NegotiationState::Stable => {
                debug!("Offer after a completed round, starting a new session");
                self.fresh_session().await
            }
            state @ (NegotiationState::HaveLocalOffer | NegotiationState::HaveRemoteOffer) => {
                info!("Offer collision in state {:?}, rolling back", state);
                match session.rollback().await {
                    Ok(()) => Ok(session),
                    Err(e) => {
                        warn!("Rollback failed ({}), starting a new session", e);
                        self.fresh_session().await
                    }
                }
            }
        }
    }

    async fn apply_answer(&mut self, answer: SessionDescription) -> Result<(), NegotiationError> {
        let Some(session) = self.session.clone() else {
            return Err(NegotiationError::StaleAnswer(NegotiationState::Idle));
        };

        match session.negotiation_state().await {
            NegotiationState::HaveLocalOffer => {}
            NegotiationState::HaveRemoteOffer => {
                return Err(NegotiationError::InvalidRemoteState(
                    "answer while a remote offer is pending".to_owned(),
                ));
            }
            state => return Err(NegotiationError::StaleAnswer(state)),
        }

        // A refused answer can leave the session stable with a broken remote
        // description, so anything short of a closed session means restart.
        let ufrag = ice_ufrag(&answer.sdp).map(str::to_owned);
        match session.set_remote_description(answer).await {
            Ok(()) => {}
            Err(PeerError::Closed) => return Err(PeerError::Closed.into()),
            Err(e) => return Err(NegotiationError::InvalidRemoteState(e.to_string())),
        }

        info!(epoch = self.epoch, "Remote answer applied");
        self.drain_candidates(&session, ufrag.as_deref()).await;
        Ok(())
    }

    async fn add_remote_candidate(&mut self, candidate: Option<IceCandidate>) {
        let Some(candidate) = candidate.filter(|c| !c.is_end_of_candidates()) else {
            debug!("Remote end-of-candidates");
            return;
        };

        let ready = match self.session.clone() {
            Some(session) => session.has_remote_description().await.then_some(session),
            None => None,
        };

        match ready {
            Some(session) => {
                if let Err(e) = session.add_ice_candidate(candidate).await {
                    warn!("Error adding ICE candidate: {}", e);
                }
            }
            None => {
                self.candidates.enqueue(candidate);
                debug!(
                    buffered = self.candidates.len(),
                    "Buffered ICE candidate until the remote description is set"
                );
            }
        }
    }

    /// Applies the buffer, minus candidates gathered for another ICE
    /// username fragment than the one just applied.
    async fn drain_candidates(&mut self, session: &Arc<dyn PeerSession>, ufrag: Option<&str>) {
        if let Some(ufrag) = ufrag {
            let dropped = self.candidates.retain_round(ufrag);
            if dropped > 0 {
                debug!(dropped, "Dropped buffered candidates from an earlier round");
            }
        }
        self.candidates
            .drain_into(|candidate| {
                let session = Arc::clone(session);
                async move { session.add_ice_candidate(candidate).await }
            })
            .await;
    }

    async fn fresh_session(&mut self) -> Result<Arc<dyn PeerSession>, NegotiationError> {
        self.close_session().await;
        self.epoch += 1;

        let events = PeerEventSender::new(self.epoch, self.peer_tx.clone());
        let session = self.factory.create(events).await?;
        self.session = Some(Arc::clone(&session));

        debug!(epoch = self.epoch, "Created peer session");
        Ok(session)
    }

    async fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Error closing peer session: {}", e);
            }
        }
    }
}
