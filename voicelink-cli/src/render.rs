use colored::*;
use voicelink_client::SessionEvent;
use voicelink_core::{ConnectionStatus, PeerConnectionState};

/// One colored terminal line per session event.
pub fn event_line(event: &SessionEvent) -> String {
    match event {
        SessionEvent::StatusChanged(status) => {
            let label = format!("{status:?}");
            let label = match status {
                ConnectionStatus::Connected => label.green(),
                ConnectionStatus::Connecting => label.yellow(),
                ConnectionStatus::Disconnected => label.normal(),
                ConnectionStatus::Failed => label.red(),
            };
            format!("{} {}", "status".bold(), label)
        }
        SessionEvent::RoomAssigned(id) => {
            format!("{} {}", "room".bold(), id.as_str().cyan().bold())
        }
        SessionEvent::Notice(text) => text.clone(),
        SessionEvent::Error(text) => format!("{} {}", "error".red().bold(), text),
        SessionEvent::Reconnecting { attempt, delay } => format!(
            "{} attempt {} in {:?}",
            "reconnecting".yellow(),
            attempt,
            delay
        ),
        SessionEvent::PeerConnection(state) => {
            let label = format!("{state:?}");
            let label = match state {
                PeerConnectionState::Connected => label.green(),
                PeerConnectionState::Failed => label.red(),
                _ => label.normal(),
            };
            format!("{} {}", "peer".bold(), label)
        }
        SessionEvent::RemoteTrack { kind } => format!("{} {}", "remote track".bold(), kind),
        SessionEvent::Left => "Left the call".dimmed().to_string(),
    }
}
