mod channel_connector;
mod channel_event;
mod channel_handle;
mod ws_connector;

pub use channel_connector::{ChannelConnector, ChannelTarget, endpoint_url};
pub use channel_event::{ChannelEvent, ChannelEventKind, ChannelEventSender};
pub use channel_handle::{ChannelHandle, Outbound};
pub use ws_connector::WsConnector;
