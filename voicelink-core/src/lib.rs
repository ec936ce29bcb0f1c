mod error;
pub mod model;
pub mod sdp;
pub mod utils;

pub use error::ProtocolError;
pub use model::*;
