use crate::integration::start_relay;
use crate::utils::{TestClient, joined_pair};
use std::time::Duration;
use voicelink_core::{Role, RoomId, SignalMessage};

#[tokio::test]
async fn returning_callee_is_announced_as_reconnected() {
    let server = start_relay().await;
    let (mut caller, callee, id) = joined_pair(&server).await;

    callee.close().await;
    let _again = TestClient::connect(&server, Role::Callee, Some(id.as_str())).await;

    assert_eq!(
        caller.recv().await,
        SignalMessage::CalleeReconnected(Some(RoomId::from(id)))
    );
    server.shutdown().await;
}

#[tokio::test]
async fn returning_caller_keeps_its_room() {
    let server = start_relay().await;
    let (caller, _callee, id) = joined_pair(&server).await;

    caller.close().await;
    let mut again = TestClient::connect(&server, Role::Caller, Some(id.as_str())).await;

    let id = RoomId::from(id);
    assert_eq!(again.recv().await, SignalMessage::RoomCreated(id.clone()));
    assert_eq!(again.recv().await, SignalMessage::CalleeReconnected(Some(id)));
    server.shutdown().await;
}

#[tokio::test]
async fn takeover_closes_the_previous_connection() {
    let server = start_relay().await;
    let (mut caller, _callee, id) = joined_pair(&server).await;

    let mut again = TestClient::connect(&server, Role::Caller, Some(id.as_str())).await;
    assert_eq!(again.recv().await, SignalMessage::RoomCreated(RoomId::from(id.as_str())));

    caller.expect_closed().await;
    // The stale socket going away must not free the new holder's slot.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.registry().contains(&RoomId::from(id)));
    server.shutdown().await;
}

#[tokio::test]
async fn room_disappears_once_both_sides_leave() {
    let server = start_relay().await;
    let (caller, callee, id) = joined_pair(&server).await;
    let id = RoomId::from(id);

    caller.close().await;
    callee.close().await;

    for _ in 0..100 {
        if !server.registry().contains(&id) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!server.registry().contains(&id));
    server.shutdown().await;
}
