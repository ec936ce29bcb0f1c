use crate::integration::start_relay;
use crate::utils::joined_pair;
use voicelink_core::SignalMessage;

#[tokio::test]
async fn shutdown_tells_both_sides_the_room_closed() {
    let server = start_relay().await;
    let (mut caller, mut callee, _id) = joined_pair(&server).await;

    server.shutdown().await;

    assert_eq!(caller.recv().await, SignalMessage::RoomClosed);
    assert_eq!(callee.recv().await, SignalMessage::RoomClosed);
    caller.expect_closed().await;
    callee.expect_closed().await;
}
