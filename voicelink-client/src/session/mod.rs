mod session_command;
mod session_controller;
mod session_event;

pub use session_command::SessionCommand;
pub use session_controller::{SessionConfig, SessionController, SessionHandle, spawn_session};
pub use session_event::SessionEvent;
