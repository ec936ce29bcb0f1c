use crate::error::PeerError;
use crate::peer::PeerEventSender;
use async_trait::async_trait;
use std::sync::Arc;
use voicelink_core::{IceCandidate, NegotiationState, SessionDescription};

/// One peer connection as the negotiation engine sees it.
///
/// Implementations report gathered candidates and connection changes
/// through the [`PeerEventSender`] they were created with.
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    async fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    /// Fails with [`PeerError::InvalidState`] when the description does not
    /// fit the current signaling state.
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    /// Abandons the pending local or remote offer.
    async fn rollback(&self) -> Result<(), PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    async fn negotiation_state(&self) -> NegotiationState;

    async fn has_remote_description(&self) -> bool;

    /// Releases the connection and the local capture.
    async fn close(&self) -> Result<(), PeerError>;
}

#[async_trait]
pub trait PeerSessionFactory: Send + Sync {
    async fn create(&self, events: PeerEventSender) -> Result<Arc<dyn PeerSession>, PeerError>;
}
