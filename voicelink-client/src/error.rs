use thiserror::Error;
use voicelink_core::{NegotiationState, ProtocolError};

/// Failures of the relay channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("relay channel is closed")]
    ChannelClosed,

    #[error("invalid relay url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to open relay channel to {url}: {reason}")]
    Open { url: String, reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Failures reported by a peer session implementation.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The description does not fit the current signaling state.
    #[error("invalid signaling state: {0}")]
    InvalidState(String),

    #[error("rejected by the peer connection: {0}")]
    Rejected(String),

    #[error("peer session is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("answer arrived in state {0:?}")]
    StaleAnswer(NegotiationState),

    #[error("remote answer does not fit the local description: {0}")]
    InvalidRemoteState(String),

    #[error("gave up after {0} ICE restarts")]
    RestartsExhausted(u32),

    #[error(transparent)]
    Peer(#[from] PeerError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session controller has stopped")]
    ControllerStopped,
}
