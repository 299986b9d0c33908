mod utils;

use roomcast::{BroadcastError, ChannelRegistry, HubConfig, LocalBroadcastHub, Room, Subscriber};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};
use utils::recording_subscriber;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    from: String,
    text: String,
}

fn message(from: &str, text: &str) -> ChatMessage {
    ChatMessage {
        from: from.to_string(),
        text: text.to_string(),
    }
}

/// Two execution contexts sharing one hub
fn two_tabs() -> (ChannelRegistry, ChannelRegistry) {
    let hub = Arc::new(LocalBroadcastHub::new(
        HubConfig::default().with_channel_capacity(32),
    ));
    (
        ChannelRegistry::new(hub.clone()),
        ChannelRegistry::new(hub),
    )
}

fn forwarding_subscriber<T: Clone + Send + 'static>() -> (Subscriber<T>, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriber = Subscriber::new(move |data: &T| {
        let _ = tx.send(data.clone());
    });
    (subscriber, rx)
}

#[tokio::test]
async fn publish_reaches_local_tab_synchronously_and_remote_tab_later() {
    let (tab_a, tab_b) = two_tabs();
    let chat = Room::<ChatMessage>::new("chat");
    let (local, local_received) = recording_subscriber::<ChatMessage>();
    let (remote, mut remote_rx) = forwarding_subscriber::<ChatMessage>();
    chat.subscribe(&tab_a, &local).unwrap();
    chat.subscribe(&tab_b, &remote).unwrap();

    chat.publish(&tab_a, &message("a", "hi")).unwrap();

    // No await between publish and this check
    assert_eq!(*local_received.lock().unwrap(), vec![message("a", "hi")]);

    let delivered = timeout(Duration::from_millis(500), remote_rx.recv())
        .await
        .expect("remote delivery timed out")
        .expect("subscriber dropped");
    assert_eq!(delivered, message("a", "hi"));
}

#[tokio::test]
async fn publisher_tab_is_not_delivered_twice() {
    let (tab_a, tab_b) = two_tabs();
    let (local, local_received) = recording_subscriber::<ChatMessage>();
    let (remote, mut remote_rx) = forwarding_subscriber::<ChatMessage>();
    tab_a.subscribe("chat", &local).unwrap();
    tab_b.subscribe("chat", &remote).unwrap();

    tab_a.publish("chat", &message("a", "once")).unwrap();
    timeout(Duration::from_millis(500), remote_rx.recv())
        .await
        .expect("remote delivery timed out");
    sleep(Duration::from_millis(20)).await;

    assert_eq!(local_received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unsubscribed_remote_tab_receives_nothing() {
    let (tab_a, tab_b) = two_tabs();
    let (remote, mut remote_rx) = forwarding_subscriber::<ChatMessage>();
    tab_b.subscribe("chat", &remote).unwrap();
    tab_b.unsubscribe("chat", &remote).unwrap();

    tab_a.publish("chat", &message("a", "anyone?")).unwrap();

    assert!(timeout(Duration::from_millis(50), remote_rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn rooms_stay_isolated_across_tabs() {
    let (tab_a, tab_b) = two_tabs();
    let (remote, mut remote_rx) = forwarding_subscriber::<ChatMessage>();
    tab_b.subscribe("A", &remote).unwrap();

    tab_a.publish("B", &message("a", "wrong room")).unwrap();

    assert!(timeout(Duration::from_millis(50), remote_rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn remote_payload_of_another_type_is_dropped() {
    let (tab_a, tab_b) = two_tabs();
    let (remote, mut remote_rx) = forwarding_subscriber::<String>();
    tab_b.subscribe("counter", &remote).unwrap();

    tab_a.publish("counter", &1u32).unwrap();
    tab_a.publish("counter", &2u32).unwrap();

    assert!(timeout(Duration::from_millis(50), remote_rx.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn remote_tab_hears_messages_in_send_order() {
    let (tab_a, tab_b) = two_tabs();
    let (remote, mut remote_rx) = forwarding_subscriber::<u32>();
    tab_b.subscribe("seq", &remote).unwrap();

    for n in 0..5u32 {
        tab_a.publish("seq", &n).unwrap();
    }

    let mut heard = Vec::new();
    for _ in 0..5 {
        let n = timeout(Duration::from_millis(500), remote_rx.recv())
            .await
            .expect("remote delivery timed out")
            .expect("subscriber dropped");
        heard.push(n);
    }
    assert_eq!(heard, vec![0, 1, 2, 3, 4]);
}

#[test]
fn subscribing_without_runtime_fails() {
    let registry = ChannelRegistry::new(Arc::new(LocalBroadcastHub::new(HubConfig::default())));
    let (cb, _) = recording_subscriber::<ChatMessage>();

    let result = registry.subscribe("chat", &cb);

    assert!(matches!(
        result,
        Err(BroadcastError::TransportUnavailable(_))
    ));
}
