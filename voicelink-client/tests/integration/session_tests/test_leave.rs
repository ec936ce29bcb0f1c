use crate::integration::{create_session, init_tracing};
use crate::utils::{drain_events, eventually, wait_for_event};
use std::time::Duration;
use voicelink_client::{ReconnectConfig, SessionEvent};
use voicelink_core::{ConnectionStatus, SignalMessage};

const LIMIT: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn test_leave_twice_is_harmless() {
    init_tracing();
    let (handle, mut events, connector, factory) = create_session(ReconnectConfig::default());

    handle.join("").await.unwrap();
    wait_for_event(&mut events, LIMIT, |e| {
        *e == SessionEvent::StatusChanged(ConnectionStatus::Connected)
    })
    .await;
    let channel = connector.latest().await;
    channel
        .deliver(SignalMessage::CalleeJoined(None))
        .await;
    eventually(LIMIT, "a peer session", || {
        let factory = factory.clone();
        async move { factory.created().await == 1 }
    })
    .await;

    handle.leave().await.unwrap();
    let seen = wait_for_event(&mut events, LIMIT, |e| *e == SessionEvent::Left).await;
    assert!(seen.contains(&SessionEvent::StatusChanged(ConnectionStatus::Disconnected)));

    assert!(channel.sent().await.contains(&SignalMessage::UserDisconnected));
    assert!(channel.was_closed_by_client().await);
    assert!(factory.session(0).await.is_closed().await);

    handle.leave().await.unwrap();
    let after = drain_events(&mut events, Duration::from_secs(1)).await;
    assert!(after.is_empty(), "second leave produced {after:?}");
    assert_eq!(connector.opens().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_leave_before_join_does_nothing() {
    init_tracing();
    let (handle, mut events, connector, _factory) = create_session(ReconnectConfig::default());

    handle.leave().await.unwrap();

    let seen = drain_events(&mut events, Duration::from_secs(1)).await;
    assert!(seen.is_empty());
    assert_eq!(connector.opens().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_room_not_found_ends_the_session() {
    init_tracing();
    let (handle, mut events, connector, _factory) = create_session(ReconnectConfig::default());

    handle.join("room-missing").await.unwrap();
    wait_for_event(&mut events, LIMIT, |e| {
        *e == SessionEvent::StatusChanged(ConnectionStatus::Connected)
    })
    .await;

    let channel = connector.latest().await;
    channel.deliver(SignalMessage::RoomNotFound).await;

    let seen = wait_for_event(&mut events, LIMIT, |e| *e == SessionEvent::Left).await;
    assert!(seen.contains(&SessionEvent::Error("Room not found".to_owned())));
    assert!(seen.contains(&SessionEvent::StatusChanged(ConnectionStatus::Disconnected)));
    assert!(!channel.sent().await.contains(&SignalMessage::UserDisconnected));

    // No retry follows a room error.
    let after = drain_events(&mut events, Duration::from_secs(10)).await;
    assert!(after.is_empty(), "unexpected events {after:?}");
    assert_eq!(connector.opens().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_room_closed_ends_the_session() {
    init_tracing();
    let (handle, mut events, connector, _factory) = create_session(ReconnectConfig::default());

    handle.join("").await.unwrap();
    wait_for_event(&mut events, LIMIT, |e| {
        *e == SessionEvent::StatusChanged(ConnectionStatus::Connected)
    })
    .await;

    connector
        .latest()
        .await
        .deliver(SignalMessage::RoomClosed)
        .await;

    let seen = wait_for_event(&mut events, LIMIT, |e| *e == SessionEvent::Left).await;
    assert!(seen.contains(&SessionEvent::Error("Room closed".to_owned())));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_says_goodbye() {
    init_tracing();
    let (handle, mut events, connector, _factory) = create_session(ReconnectConfig::default());

    handle.join("room-1").await.unwrap();
    wait_for_event(&mut events, LIMIT, |e| {
        *e == SessionEvent::StatusChanged(ConnectionStatus::Connected)
    })
    .await;
    let channel = connector.latest().await;

    drop(handle);

    eventually(LIMIT, "the channel to be closed", || {
        let channel = channel.clone();
        async move { channel.was_closed_by_client().await }
    })
    .await;
    assert!(channel.sent().await.contains(&SignalMessage::UserDisconnected));
}
