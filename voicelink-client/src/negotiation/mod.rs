mod candidate_buffer;
mod negotiation_engine;
mod signaling_output;

pub use candidate_buffer::CandidateBuffer;
pub use negotiation_engine::{MAX_ICE_RESTARTS, NegotiationEngine, RestartReason};
pub use signaling_output::{RelayOutput, SignalingOutput};
