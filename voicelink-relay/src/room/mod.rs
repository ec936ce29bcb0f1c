mod relay_room;
mod room_registry;

pub use relay_room::{Occupant, RelayFrame, RelayRoom};
pub use room_registry::RoomRegistry;
