use anyhow::Result;
use std::sync::Arc;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Source of the local audio track.
///
/// Called once per peer session. An error makes the session continue
/// receive-only.
pub trait MediaCapture: Send + Sync {
    fn acquire(&self) -> Result<Arc<dyn TrackLocal + Send + Sync>>;
}

/// Opus track fed by the embedding application.
///
/// Write encoded frames to [`OpusTrackCapture::track`]; every peer session
/// of the call sends from the same track.
pub struct OpusTrackCapture {
    track: Arc<TrackLocalStaticSample>,
}

impl OpusTrackCapture {
    pub fn new(stream_id: impl Into<String>) -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "audio".to_owned(),
            stream_id.into(),
        ));
        Self { track }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.track)
    }
}

impl MediaCapture for OpusTrackCapture {
    fn acquire(&self) -> Result<Arc<dyn TrackLocal + Send + Sync>> {
        Ok(self.track.clone() as Arc<dyn TrackLocal + Send + Sync>)
    }
}
