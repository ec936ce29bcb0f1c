use crate::channel::{
    ChannelConnector, ChannelEventKind, ChannelEventSender, ChannelHandle, ChannelTarget,
    Outbound, endpoint_url,
};
use crate::error::ChannelError;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use voicelink_core::{ProtocolError, SignalMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector for the relay.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn open(
        &self,
        target: &ChannelTarget,
        events: ChannelEventSender,
    ) -> Result<ChannelHandle, ChannelError> {
        let url = endpoint_url(&self.base_url, target)?;
        info!(generation = events.generation(), "Connecting to relay at {}", url);

        let (ws_stream, _) =
            connect_async(url.as_str())
                .await
                .map_err(|e| ChannelError::Open {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let (write, read) = ws_stream.split();
        let (handle, outbound_rx) = ChannelHandle::new(events.generation());

        // Opened goes out before the reader starts so it is always the first
        // event of this generation.
        events.emit(ChannelEventKind::Opened).await;

        tokio::spawn(write_loop(write, outbound_rx, handle.clone()));
        tokio::spawn(read_loop(read, events, handle.clone()));

        Ok(handle)
    }
}

async fn write_loop(
    mut write: SplitSink<WsStream, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    handle: ChannelHandle,
) {
    while let Some(out) = outbound_rx.recv().await {
        match out {
            Outbound::Frame(text) => {
                if let Err(e) = write.send(Message::Text(text)).await {
                    debug!(generation = handle.generation(), "Relay write failed: {}", e);
                    break;
                }
            }
            Outbound::Close => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }

    handle.mark_closed();
    let _ = write.close().await;
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    events: ChannelEventSender,
    handle: ChannelHandle,
) {
    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match SignalMessage::decode(&text) {
                Ok(msg) => {
                    debug!(generation = events.generation(), "<- {}", msg.tag());
                    if !events.emit(ChannelEventKind::MessageReceived(msg)).await {
                        break "session dropped".to_owned();
                    }
                }
                Err(ProtocolError::UnknownType(kind)) => {
                    warn!("Ignoring relay frame with unknown type `{}`", kind);
                }
                Err(e) => warn!("Ignoring malformed relay frame: {}", e),
            },
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "closed by relay".to_owned());
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                events
                    .emit(ChannelEventKind::ErrorOccurred(e.to_string()))
                    .await;
                break e.to_string();
            }
            None => break "stream ended".to_owned(),
        }
    };

    info!(generation = events.generation(), "Relay channel closed: {}", reason);
    handle.close();
    events.emit(ChannelEventKind::Closed(reason)).await;
}
