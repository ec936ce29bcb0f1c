use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use voicelink_client::SessionEvent;
use voicelink_core::{IceCandidate, SessionDescription, SignalMessage};

pub fn candidate(n: u32) -> IceCandidate {
    IceCandidate::new(format!(
        "candidate:{n} 1 udp 2130706431 192.168.1.{n} {} typ host",
        50000 + n
    ))
    .with_mid("0", 0)
}

pub fn remote_candidate(n: u32) -> SignalMessage {
    SignalMessage::IceCandidate(Some(candidate(n)))
}

pub fn remote_offer() -> SignalMessage {
    SignalMessage::Offer(SessionDescription::offer(
        "v=0\r\no=- 9 1 IN IP4 10.0.0.9\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:0\r\n",
    ))
}

pub fn remote_answer() -> SignalMessage {
    SignalMessage::Answer(SessionDescription::answer(
        "v=0\r\no=- 9 2 IN IP4 10.0.0.9\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:0\r\n",
    ))
}

pub fn remote_answer_with_ufrag(ufrag: &str) -> SignalMessage {
    SignalMessage::Answer(SessionDescription::answer(format!(
        "v=0\r\no=- 9 2 IN IP4 10.0.0.9\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=ice-ufrag:{ufrag}\r\na=mid:0\r\n"
    )))
}

/// Reads session events until one matches. Returns everything read,
/// the match last. Panics when nothing matches within `limit`.
pub async fn wait_for_event<F>(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    limit: Duration,
    mut pred: F,
) -> Vec<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    let mut seen = Vec::new();
    let result = timeout(limit, async {
        while let Some(event) = rx.recv().await {
            let done = pred(&event);
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await;

    match result {
        Ok(true) => seen,
        _ => panic!("expected session event not seen, got {seen:?}"),
    }
}

/// Collects whatever arrives within `window`.
pub async fn drain_events(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    window: Duration,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Ok(Some(event)) = timeout(window, rx.recv()).await {
        seen.push(event);
    }
    seen
}

/// Polls `check` every 10ms until it holds. Panics after `limit`.
pub async fn eventually<F, Fut>(limit: Duration, what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if check().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
