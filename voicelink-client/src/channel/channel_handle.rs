use crate::error::ChannelError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use voicelink_core::SignalMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(String),
    Close,
}

/// Write side of an open relay channel.
///
/// Cheap to clone. The socket task owning the other end of `outbound`
/// flips `open` to false when the socket goes away.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    generation: u64,
    outbound: mpsc::UnboundedSender<Outbound>,
    open: Arc<AtomicBool>,
}

impl ChannelHandle {
    pub fn new(generation: u64) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let handle = Self {
            generation,
            outbound,
            open: Arc::new(AtomicBool::new(true)),
        };
        (handle, outbound_rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Queues one message for the socket. Fails without side effects when
    /// the channel is not open.
    pub fn send(&self, msg: &SignalMessage) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::ChannelClosed);
        }
        let text = msg.encode()?;
        debug!(generation = self.generation, "-> {}", msg.tag());
        self.outbound
            .send(Outbound::Frame(text))
            .map_err(|_| ChannelError::ChannelClosed)
    }

    /// Asks the socket task to close. Frames queued before this are still
    /// written.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            let _ = self.outbound.send(Outbound::Close);
        }
    }
}
