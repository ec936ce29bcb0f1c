use tokio::sync::mpsc;
use voicelink_core::SignalMessage;

/// Something that happened on one relay channel.
///
/// `generation` identifies the channel instance. Every reopen gets a new
/// generation so the session can drop events from sockets it already
/// abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub generation: u64,
    pub kind: ChannelEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEventKind {
    Opened,
    Closed(String),
    ErrorOccurred(String),
    MessageReceived(SignalMessage),
}

/// Sender half handed to a connector for one channel instance.
#[derive(Debug, Clone)]
pub struct ChannelEventSender {
    generation: u64,
    tx: mpsc::Sender<ChannelEvent>,
}

impl ChannelEventSender {
    pub fn new(generation: u64, tx: mpsc::Sender<ChannelEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the session is gone.
    pub async fn emit(&self, kind: ChannelEventKind) -> bool {
        let event = ChannelEvent {
            generation: self.generation,
            kind,
        };
        self.tx.send(event).await.is_ok()
    }
}
