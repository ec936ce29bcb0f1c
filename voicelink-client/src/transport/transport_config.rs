use voicelink_core::IceServerConfig;
use voicelink_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, DEFAULT_STUN_ADDR_4,
    DEFAULT_STUN_ADDR_5,
};

/// WebRTC settings for every peer session of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl TransportConfig {
    /// Replaces the default STUN list. An empty list keeps the defaults.
    pub fn with_stun_servers(urls: Vec<String>) -> Self {
        if urls.is_empty() {
            return Self::default();
        }
        Self {
            ice_servers: vec![IceServerConfig {
                urls,
                username: None,
                credential: None,
            }],
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: [
                    DEFAULT_STUN_ADDR,
                    DEFAULT_STUN_ADDR_2,
                    DEFAULT_STUN_ADDR_3,
                    DEFAULT_STUN_ADDR_4,
                    DEFAULT_STUN_ADDR_5,
                ]
                .map(str::to_owned)
                .to_vec(),
                username: None,
                credential: None,
            }],
        }
    }
}
