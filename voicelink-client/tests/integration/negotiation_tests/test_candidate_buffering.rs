use crate::integration::{EngineHarness, init_tracing};
use crate::utils::{
    candidate, remote_answer, remote_answer_with_ufrag, remote_candidate, remote_offer,
};
use voicelink_core::{IceCandidate, NegotiationState, SignalMessage};

#[tokio::test]
async fn test_candidates_before_offer_are_applied_in_arrival_order() {
    init_tracing();
    let mut h = EngineHarness::new();

    for n in 1..=3 {
        h.signal(remote_candidate(n)).await;
    }
    assert_eq!(h.engine.buffered_candidates(), 3);
    assert_eq!(h.factory.created().await, 0);

    h.signal(remote_offer()).await;

    let session = h.factory.session(0).await;
    assert_eq!(
        session.applied_candidates().await,
        vec![candidate(1), candidate(2), candidate(3)]
    );
    assert_eq!(h.engine.buffered_candidates(), 0);
    assert_eq!(h.out.answers().await.len(), 1);
    assert_eq!(h.engine.state().await, NegotiationState::Stable);
}

#[tokio::test]
async fn test_candidate_after_remote_description_is_applied_directly() {
    init_tracing();
    let mut h = EngineHarness::new();

    h.signal(remote_offer()).await;
    h.signal(remote_candidate(7)).await;

    assert_eq!(h.engine.buffered_candidates(), 0);
    assert_eq!(
        h.factory.session(0).await.applied_candidates().await,
        vec![candidate(7)]
    );
}

#[tokio::test]
async fn test_caller_buffers_until_answer() {
    init_tracing();
    let mut h = EngineHarness::new();

    h.signal(SignalMessage::CalleeJoined(None)).await;
    h.signal(remote_candidate(1)).await;
    h.signal(remote_candidate(2)).await;
    assert_eq!(h.engine.buffered_candidates(), 2);

    h.signal(remote_answer()).await;

    assert_eq!(h.engine.buffered_candidates(), 0);
    assert_eq!(
        h.factory.session(0).await.applied_candidates().await,
        vec![candidate(1), candidate(2)]
    );
}

#[tokio::test]
async fn test_rejected_buffered_candidate_does_not_block_the_rest() {
    init_tracing();
    let mut h = EngineHarness::new();

    h.signal(remote_candidate(1)).await;
    h.signal(SignalMessage::IceCandidate(Some(IceCandidate::new(
        "candidate:invalid",
    ))))
    .await;
    h.signal(remote_candidate(3)).await;

    h.signal(remote_offer()).await;

    assert_eq!(
        h.factory.session(0).await.applied_candidates().await,
        vec![candidate(1), candidate(3)]
    );
    assert_eq!(h.engine.buffered_candidates(), 0);
}

#[tokio::test]
async fn test_end_of_candidates_is_not_buffered() {
    init_tracing();
    let mut h = EngineHarness::new();

    h.signal(SignalMessage::IceCandidate(None)).await;
    h.signal(SignalMessage::IceCandidate(Some(IceCandidate::new(""))))
        .await;

    assert_eq!(h.engine.buffered_candidates(), 0);
}

#[tokio::test]
async fn test_late_candidates_from_before_a_restart_are_dropped() {
    init_tracing();
    let mut h = EngineHarness::new();

    h.signal(SignalMessage::CalleeJoined(None)).await;
    h.factory.session(0).await.reject_answers().await;
    h.signal(remote_answer_with_ufrag("old")).await;
    assert_eq!(h.engine.restarts(), 1);

    let mut stale = candidate(1);
    stale.username_fragment = Some("old".to_owned());
    let mut current = candidate(2);
    current.username_fragment = Some("new".to_owned());
    h.signal(SignalMessage::IceCandidate(Some(stale))).await;
    h.signal(SignalMessage::IceCandidate(Some(current.clone()))).await;
    h.signal(remote_candidate(3)).await;
    assert_eq!(h.engine.buffered_candidates(), 3);

    h.signal(remote_answer_with_ufrag("new")).await;

    assert_eq!(
        h.factory.session(1).await.applied_candidates().await,
        vec![current, candidate(3)]
    );
    assert_eq!(h.engine.buffered_candidates(), 0);
}
