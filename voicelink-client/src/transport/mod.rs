mod media_capture;
mod transport_config;
mod webrtc_session;

pub use media_capture::{MediaCapture, OpusTrackCapture};
pub use transport_config::TransportConfig;
pub use webrtc_session::{WebRtcSession, WebRtcSessionFactory};
