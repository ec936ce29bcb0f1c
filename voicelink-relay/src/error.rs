use thiserror::Error;
use voicelink_core::RoomId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("room id is required")]
    MissingRoomId,

    #[error("room `{0}` not found")]
    RoomNotFound(RoomId),
}
