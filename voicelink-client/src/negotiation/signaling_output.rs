use crate::channel::ChannelHandle;
use async_trait::async_trait;
use tracing::warn;
use voicelink_core::{IceCandidate, SessionDescription, SignalMessage};

/// Outgoing half of the signaling path, as the negotiation engine sees it.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, offer: SessionDescription);

    async fn send_answer(&self, answer: SessionDescription);

    async fn send_ice_candidate(&self, candidate: IceCandidate);
}

/// Sends through the current relay channel, if there is one.
///
/// Without an open channel every send is a logged no-op.
pub struct RelayOutput<'a>(pub Option<&'a ChannelHandle>);

impl RelayOutput<'_> {
    fn send(&self, msg: SignalMessage) {
        let Some(channel) = self.0 else {
            warn!("No relay channel, dropping outgoing {}", msg.tag());
            return;
        };
        if let Err(e) = channel.send(&msg) {
            warn!("Failed to send {}: {}", msg.tag(), e);
        }
    }
}

#[async_trait]
impl SignalingOutput for RelayOutput<'_> {
    async fn send_offer(&self, offer: SessionDescription) {
        self.send(SignalMessage::Offer(offer));
    }

    async fn send_answer(&self, answer: SessionDescription) {
        self.send(SignalMessage::Answer(answer));
    }

    async fn send_ice_candidate(&self, candidate: IceCandidate) {
        self.send(SignalMessage::IceCandidate(Some(candidate)));
    }
}
