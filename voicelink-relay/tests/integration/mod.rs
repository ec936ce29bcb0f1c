//! Relay tests over real sockets.
//!
//! - `rendezvous_tests` - room creation, joining and rejoining
//! - `forwarding_tests` - frame relaying and shutdown


use std::net::SocketAddr;
use tracing::Level;
use voicelink_relay::RelayServer;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Starts a relay on an ephemeral local port.
pub async fn start_relay() -> RelayServer {
    init_tracing();
    RelayServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind relay")
}
