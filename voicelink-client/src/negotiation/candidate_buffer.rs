use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};
use voicelink_core::IceCandidate;

/// Remote candidates that arrived before the remote description.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    queue: VecDeque<IceCandidate>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// End-of-candidates markers are not kept.
    pub fn enqueue(&mut self, candidate: IceCandidate) -> bool {
        if candidate.is_end_of_candidates() {
            debug!("Dropping end-of-candidates marker instead of buffering it");
            return false;
        }
        self.queue.push_back(candidate);
        true
    }

    /// Applies every buffered candidate in arrival order and empties the
    /// buffer. A failing candidate is logged and skipped. Returns how many
    /// were applied.
    pub async fn drain_into<F, Fut, E>(&mut self, mut apply: F) -> usize
    where
        F: FnMut(IceCandidate) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let pending = std::mem::take(&mut self.queue);
        let total = pending.len();
        let mut applied = 0;

        for candidate in pending {
            match apply(candidate).await {
                Ok(()) => applied += 1,
                Err(e) => warn!("Error adding buffered ICE candidate: {}", e),
            }
        }

        if total > 0 {
            debug!(total, applied, "Drained buffered ICE candidates");
        }
        applied
    }

    /// Drops candidates tagged with a different username fragment. Untagged
    /// candidates stay. Returns how many were dropped.
    pub fn retain_round(&mut self, ufrag: &str) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|c| c.username_fragment.as_deref().is_none_or(|u| u == ufrag));
        before - self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
