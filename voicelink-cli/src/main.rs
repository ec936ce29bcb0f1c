mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voicelink_client::{
    MediaCapture, OpusTrackCapture, ReconnectConfig, SessionConfig, SessionEvent, TransportConfig,
};
use voicelink_core::ConnectionStatus;
use voicelink_relay::RelayConfig;

#[derive(Parser)]
#[command(name = "voicelink", version, about = "Two-party voice calls over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rendezvous relay.
    Relay {
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },
    /// Create or join a call.
    Call {
        #[arg(long, default_value = "ws://localhost:3000")]
        server: String,

        /// Room to join. Leave empty to create one.
        #[arg(long, default_value = "")]
        room: String,

        /// Replaces the default STUN servers.
        #[arg(long = "stun")]
        stun: Vec<String>,

        /// Seconds between reconnect attempts.
        #[arg(long, default_value_t = 2)]
        retry_delay: u64,

        #[arg(long, default_value_t = 15)]
        max_retries: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay { bind } => voicelink_relay::serve(RelayConfig { bind }).await,
        Commands::Call {
            server,
            room,
            stun,
            retry_delay,
            max_retries,
        } => {
            let mut config = SessionConfig::new(server);
            if !stun.is_empty() {
                config.transport = TransportConfig::with_stun_servers(stun);
            }
            config.reconnect = ReconnectConfig {
                delay: Duration::from_secs(retry_delay),
                max_attempts: max_retries,
            };
            call(config, room).await
        }
    }
}

async fn call(config: SessionConfig, room: String) -> Result<()> {
    let capture: Arc<dyn MediaCapture> = Arc::new(OpusTrackCapture::new("voicelink"));
    let (handle, mut events) = config.spawn(Some(capture));

    handle.join(room).await.context("Session stopped before joining")?;
    println!(
        "{}",
        "Commands: reconnect, leave. Ctrl-C leaves the call.".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                println!("{}", render::event_line(&event));
                if matches!(
                    event,
                    SessionEvent::Left | SessionEvent::StatusChanged(ConnectionStatus::Failed)
                ) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    Some("reconnect") => handle.reconnect().await?,
                    Some("leave") | Some("quit") => handle.leave().await?,
                    Some("") => {}
                    Some(other) => println!("{} {}", "Unknown command:".yellow(), other),
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving call");
                handle.leave().await?;
            }
        }
    }

    Ok(())
}
