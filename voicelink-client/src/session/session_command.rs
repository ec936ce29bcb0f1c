/// Commands accepted by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Empty id creates a room as caller, anything else joins it as callee.
    Join(String),
    Leave,
    /// Reopen the relay channel for the current room right away.
    Reconnect,
}
