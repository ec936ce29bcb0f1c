mod channel;
mod error;
mod negotiation;
mod peer;
mod reconnect;
mod session;
mod transport;

pub use channel::*;
pub use error::*;
pub use negotiation::*;
pub use peer::*;
pub use reconnect::*;
pub use session::*;
pub use transport::*;
