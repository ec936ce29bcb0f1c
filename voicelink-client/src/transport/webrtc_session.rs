use crate::error::PeerError;
use crate::peer::{PeerEventKind, PeerEventSender, PeerSession, PeerSessionFactory};
use crate::transport::{MediaCapture, TransportConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use voicelink_core::{
    IceCandidate, IceConnectionState, NegotiationState, PeerConnectionState, SdpType,
    SessionDescription,
};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

/// [`PeerSession`] backed by a webrtc-rs peer connection with one audio
/// transceiver.
pub struct WebRtcSession {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcSession {
    pub async fn new(
        config: &TransportConfig,
        capture: Option<&dyn MediaCapture>,
        events: PeerEventSender,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            bundle_policy: RTCBundlePolicy::MaxBundle,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Trickle ICE: every local candidate goes to the engine.
        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let candidate = match c.map(|c| c.to_json()).transpose() {
                    Ok(init) => init.map(from_candidate_init),
                    Err(e) => {
                        warn!("Failed to serialize local ICE candidate: {}", e);
                        return;
                    }
                };
                events.emit(PeerEventKind::LocalCandidate(candidate)).await;
            })
        }));

        let ice_state_events = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let events = ice_state_events.clone();
                Box::pin(async move {
                    debug!(epoch = events.epoch(), "ICE connection state: {}", s);
                    events
                        .emit(PeerEventKind::IceConnectionState(ice_state(s)))
                        .await;
                })
            },
        ));

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!(epoch = events.epoch(), "Peer connection state: {}", s);
                    events
                        .emit(PeerEventKind::ConnectionState(connection_state(s)))
                        .await;
                })
            },
        ));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            Box::pin(async move {
                info!("Remote {} track {} arrived", track.kind(), track.id());
                events
                    .emit(PeerEventKind::RemoteTrack {
                        kind: track.kind().to_string(),
                        track_id: track.id(),
                    })
                    .await;
            })
        }));

        let local_track = match capture.map(|c| c.acquire()).transpose() {
            Ok(track) => track,
            Err(e) => {
                warn!("Local audio unavailable, continuing receive-only: {}", e);
                events
                    .emit(PeerEventKind::MediaUnavailable(e.to_string()))
                    .await;
                None
            }
        };

        match local_track {
            Some(track) => {
                peer_connection.add_track(track).await?;
            }
            None => {
                peer_connection
                    .add_transceiver_from_kind(
                        RTPCodecType::Audio,
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await?;
            }
        }

        Ok(Self { peer_connection })
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }
}

#[async_trait]
impl PeerSession for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(classify)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(classify)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await
            .map_err(classify)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        if desc.kind == SdpType::Answer
            && self.peer_connection.signaling_state() != RTCSignalingState::HaveLocalOffer
        {
            return Err(PeerError::InvalidState(format!(
                "answer in signaling state {}",
                self.peer_connection.signaling_state()
            )));
        }
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await
            .map_err(classify)
    }

    async fn rollback(&self) -> Result<(), PeerError> {
        let rollback = to_rtc(SessionDescription {
            kind: SdpType::Rollback,
            sdp: String::new(),
        })?;

        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveLocalPranswer => self
                .peer_connection
                .set_local_description(rollback)
                .await
                .map_err(classify),
            RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveRemotePranswer => self
                .peer_connection
                .set_remote_description(rollback)
                .await
                .map_err(classify),
            state => Err(PeerError::InvalidState(format!(
                "nothing to roll back in signaling state {state}"
            ))),
        }
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(classify)
    }

    async fn negotiation_state(&self) -> NegotiationState {
        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveLocalPranswer => {
                NegotiationState::HaveLocalOffer
            }
            RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveRemotePranswer => {
                NegotiationState::HaveRemoteOffer
            }
            RTCSignalingState::Stable => {
                if self.peer_connection.remote_description().await.is_some() {
                    NegotiationState::Stable
                } else {
                    NegotiationState::Idle
                }
            }
            _ => NegotiationState::Idle,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.peer_connection.close().await.map_err(classify)
    }
}

/// Creates a [`WebRtcSession`] per negotiation epoch.
pub struct WebRtcSessionFactory {
    config: TransportConfig,
    capture: Option<Arc<dyn MediaCapture>>,
}

impl WebRtcSessionFactory {
    /// `capture: None` makes every session receive-only.
    pub fn new(config: TransportConfig, capture: Option<Arc<dyn MediaCapture>>) -> Self {
        Self { config, capture }
    }
}

#[async_trait]
impl PeerSessionFactory for WebRtcSessionFactory {
    async fn create(&self, events: PeerEventSender) -> Result<Arc<dyn PeerSession>, PeerError> {
        let session = WebRtcSession::new(&self.config, self.capture.as_deref(), events).await?;
        Ok(Arc::new(session))
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, PeerError> {
    let rtc = match desc.kind {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        // There is no public constructor for rollback; the JSON form is the
        // one the browser uses too.
        SdpType::Rollback => {
            return serde_json::from_value(serde_json::json!({ "type": "rollback", "sdp": "" }))
                .map_err(|e| PeerError::Rejected(e.to_string()));
        }
    };
    rtc.map_err(|e| PeerError::Rejected(e.to_string()))
}

fn classify(err: webrtc::Error) -> PeerError {
    match err {
        webrtc::Error::ErrSignalingStateProposedTransitionInvalid { .. }
        | webrtc::Error::ErrSignalingStateCannotRollback { .. }
        | webrtc::Error::ErrIncorrectSignalingState { .. } => PeerError::InvalidState(err.to_string()),
        webrtc::Error::ErrConnectionClosed { .. } => PeerError::Closed,
        other => PeerError::Rejected(other.to_string()),
    }
}

fn from_candidate_init(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn ice_state(s: RTCIceConnectionState) -> IceConnectionState {
    match s {
        RTCIceConnectionState::Checking => IceConnectionState::Checking,
        RTCIceConnectionState::Connected => IceConnectionState::Connected,
        RTCIceConnectionState::Completed => IceConnectionState::Completed,
        RTCIceConnectionState::Disconnected => IceConnectionState::Disconnected,
        RTCIceConnectionState::Failed => IceConnectionState::Failed,
        RTCIceConnectionState::Closed => IceConnectionState::Closed,
        _ => IceConnectionState::New,
    }
}

fn connection_state(s: RTCPeerConnectionState) -> PeerConnectionState {
    match s {
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => PeerConnectionState::New,
    }
}
