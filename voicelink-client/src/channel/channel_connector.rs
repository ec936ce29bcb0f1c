use crate::channel::{ChannelEventSender, ChannelHandle};
use crate::error::ChannelError;
use async_trait::async_trait;
use url::Url;
use voicelink_core::utils::ROOM_QUERY_PARAM;
use voicelink_core::{Role, Room, RoomId};

/// Where a channel should attach: the role endpoint and the room, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub role: Role,
    pub room_id: Option<RoomId>,
}

impl From<&Room> for ChannelTarget {
    fn from(room: &Room) -> Self {
        Self {
            role: room.role(),
            room_id: room.id().cloned(),
        }
    }
}

/// Opens relay channels.
///
/// An implementation reports `Opened` through `events` before returning
/// the handle, then every inbound message, and finally exactly one
/// `Closed`.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn open(
        &self,
        target: &ChannelTarget,
        events: ChannelEventSender,
    ) -> Result<ChannelHandle, ChannelError>;
}

/// Builds `{base}/ws/{caller|callee}?roomID={id}`.
pub fn endpoint_url(base: &str, target: &ChannelTarget) -> Result<Url, ChannelError> {
    let invalid = |reason: String| ChannelError::InvalidUrl {
        url: base.to_owned(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("url cannot carry a path".to_owned()))?
        .pop_if_empty()
        .extend(["ws", target.role.endpoint()]);

    let room = target.room_id.as_ref().map(RoomId::as_str).unwrap_or("");
    url.query_pairs_mut()
        .clear()
        .append_pair(ROOM_QUERY_PARAM, room);

    Ok(url)
}
