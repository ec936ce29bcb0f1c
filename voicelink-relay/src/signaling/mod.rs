mod ws_handler;

pub use ws_handler::{RoomQuery, callee_handler, caller_handler};
