use crate::error::ProtocolError;
use crate::model::ice_candidate::IceCandidate;
use crate::model::room::RoomId;
use crate::model::session_description::{SdpType, SessionDescription};
use crate::utils::USER_LEFT_NOTICE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

const ROOM_CREATED: &str = "roomCreated";
const USER_DISCONNECTED: &str = "userDisconnected";
const CALLEE_JOINED: &str = "calleeJoined";
const CALLEE_RECONNECTED: &str = "calleeReconnected";
const OFFER: &str = "offer";
const ANSWER: &str = "answer";
const ICE_CANDIDATE: &str = "iceCandidate";
const ROOM_NOT_FOUND: &str = "roomNotFound";
const ROOM_CLOSED: &str = "roomClosed";

/// One text frame on the relay socket: `{"type": <tag>, "value": <string>}`.
///
/// The relay forwards frames without looking into `value`, so the
/// description and candidate payloads are JSON documents embedded as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl WireFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Malformed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    RoomCreated(RoomId),
    UserDisconnected,
    CalleeJoined(Option<RoomId>),
    CalleeReconnected(Option<RoomId>),
    Offer(SessionDescription),
    Answer(SessionDescription),
    /// `None` is the end-of-candidates marker.
    IceCandidate(Option<IceCandidate>),
    RoomNotFound,
    RoomClosed,
}

impl SignalMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            SignalMessage::RoomCreated(_) => ROOM_CREATED,
            SignalMessage::UserDisconnected => USER_DISCONNECTED,
            SignalMessage::CalleeJoined(_) => CALLEE_JOINED,
            SignalMessage::CalleeReconnected(_) => CALLEE_RECONNECTED,
            SignalMessage::Offer(_) => OFFER,
            SignalMessage::Answer(_) => ANSWER,
            SignalMessage::IceCandidate(_) => ICE_CANDIDATE,
            SignalMessage::RoomNotFound => ROOM_NOT_FOUND,
            SignalMessage::RoomClosed => ROOM_CLOSED,
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Self::try_from(WireFrame::parse(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        WireFrame::try_from(self)?.to_json()
    }
}

impl TryFrom<WireFrame> for SignalMessage {
    type Error = ProtocolError;

    fn try_from(frame: WireFrame) -> Result<Self, Self::Error> {
        let msg = match frame.kind.as_str() {
            ROOM_CREATED => match optional_room(&frame.value) {
                Some(id) => SignalMessage::RoomCreated(id),
                None => {
                    return Err(ProtocolError::InvalidPayload {
                        tag: ROOM_CREATED,
                        reason: "missing room id".to_owned(),
                    });
                }
            },
            USER_DISCONNECTED => SignalMessage::UserDisconnected,
            CALLEE_JOINED => SignalMessage::CalleeJoined(optional_room(&frame.value)),
            CALLEE_RECONNECTED => SignalMessage::CalleeReconnected(optional_room(&frame.value)),
            OFFER => SignalMessage::Offer(description(OFFER, SdpType::Offer, &frame.value)?),
            ANSWER => SignalMessage::Answer(description(ANSWER, SdpType::Answer, &frame.value)?),
            ICE_CANDIDATE => SignalMessage::IceCandidate(candidate(&frame.value)?),
            ROOM_NOT_FOUND => SignalMessage::RoomNotFound,
            ROOM_CLOSED => SignalMessage::RoomClosed,
            _ => return Err(ProtocolError::UnknownType(frame.kind)),
        };
        Ok(msg)
    }
}

impl TryFrom<&SignalMessage> for WireFrame {
    type Error = ProtocolError;

    fn try_from(msg: &SignalMessage) -> Result<Self, Self::Error> {
        let value = match msg {
            SignalMessage::RoomCreated(id) => id.to_string(),
            SignalMessage::CalleeJoined(id) | SignalMessage::CalleeReconnected(id) => {
                id.as_ref().map(RoomId::to_string).unwrap_or_default()
            }
            SignalMessage::UserDisconnected => USER_LEFT_NOTICE.to_owned(),
            SignalMessage::Offer(desc) | SignalMessage::Answer(desc) => {
                serde_json::to_string(desc).map_err(ProtocolError::Malformed)?
            }
            SignalMessage::IceCandidate(candidate) => {
                serde_json::to_string(candidate).map_err(ProtocolError::Malformed)?
            }
            SignalMessage::RoomNotFound | SignalMessage::RoomClosed => String::new(),
        };

        Ok(WireFrame {
            kind: msg.tag().to_owned(),
            value,
        })
    }
}

fn optional_room(value: &str) -> Option<RoomId> {
    let value = value.trim();
    (!value.is_empty()).then(|| RoomId::from(value))
}

fn description(
    tag: &'static str,
    expected: SdpType,
    value: &str,
) -> Result<SessionDescription, ProtocolError> {
    let desc: SessionDescription =
        serde_json::from_str(value).map_err(|e| ProtocolError::InvalidPayload {
            tag,
            reason: e.to_string(),
        })?;

    if desc.kind != expected {
        return Err(ProtocolError::InvalidPayload {
            tag,
            reason: format!("description type {:?} in {} frame", desc.kind, tag),
        });
    }
    if desc.sdp.trim().is_empty() {
        return Err(ProtocolError::InvalidPayload {
            tag,
            reason: "empty sdp".to_owned(),
        });
    }

    Ok(desc)
}

/// `null`, an empty value and an empty `candidate` line all mean
/// end-of-candidates.
fn candidate(value: &str) -> Result<Option<IceCandidate>, ProtocolError> {
    if value.trim().is_empty() {
        return Ok(None);
    }

    let candidate: Option<IceCandidate> =
        serde_json::from_str(value).map_err(|e| ProtocolError::InvalidPayload {
            tag: ICE_CANDIDATE,
            reason: e.to_string(),
        })?;

    Ok(candidate.filter(|c| !c.is_end_of_candidates()))
}
