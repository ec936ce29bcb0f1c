mod reconnection_policy;

pub use reconnection_policy::{ReconnectConfig, ReconnectionPolicy, RetryDecision};
