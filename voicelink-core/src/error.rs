use thiserror::Error;

/// Errors raised while decoding or encoding relay frames.
///
/// None of these are fatal to a session: the receiving side logs them and
/// keeps processing the channel.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("`{tag}` frame carries an invalid payload: {reason}")]
    InvalidPayload { tag: &'static str, reason: String },
}
