pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_5: &str = "stun:stun4.l.google.com:19302";

/// Query parameter carrying the room id on both relay endpoints.
pub const ROOM_QUERY_PARAM: &str = "roomID";

/// Payload sent with `userDisconnected` when a peer leaves on purpose.
pub const USER_LEFT_NOTICE: &str = "User left the call";
