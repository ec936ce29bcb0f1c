mod error;
mod room;
mod server;
mod signaling;

pub use error::RelayError;
pub use room::*;
pub use server::{RelayConfig, RelayServer, router, serve};
pub use signaling::*;
