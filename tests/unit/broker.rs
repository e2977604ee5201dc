use assert_matches::assert_matches;
use duet_relay::brokers::memory::InMemoryBroker;
use duet_relay::core::broker::MessageBroker;
use duet_relay::core::error::BrokerError;
use duet_relay::core::message::{BrokerEnvelope, Message, RoomId, UserId};

fn envelope(content: &str) -> BrokerEnvelope {
    BrokerEnvelope::new(
        Message {
            content: content.to_string(),
            target_room_id: RoomId(1),
            sender_id: UserId(1),
            sender_name: "u1".to_string(),
        },
        None,
    )
}

#[tokio::test]
async fn test_publish_order_matches_subscribe_order() {
    let broker = InMemoryBroker::new(16);
    let mut rx = broker.subscribe().expect("first subscribe");

    broker.publish(envelope("m1")).await.expect("publish m1");
    broker.publish(envelope("m2")).await.expect("publish m2");
    broker.publish(envelope("m3")).await.expect("publish m3");

    assert_eq!(rx.recv().await.unwrap().message.content, "m1");
    assert_eq!(rx.recv().await.unwrap().message.content, "m2");
    assert_eq!(rx.recv().await.unwrap().message.content, "m3");
}

#[test]
fn test_second_subscribe_fails() {
    let broker = InMemoryBroker::new(16);
    let _rx = broker.subscribe().expect("first subscribe");
    assert_matches!(broker.subscribe(), Err(BrokerError::SubscriptionTaken));
}

#[tokio::test]
async fn test_publish_fails_once_consumer_is_gone() {
    let broker = InMemoryBroker::new(16);
    let rx = broker.subscribe().expect("subscribe");
    drop(rx);

    assert_matches!(broker.publish(envelope("m1")).await, Err(BrokerError::Unavailable));
}

#[tokio::test]
async fn test_identical_content_is_not_deduplicated() {
    let broker = InMemoryBroker::new(16);
    let mut rx = broker.subscribe().expect("subscribe");

    broker.publish(envelope("same")).await.expect("publish");
    broker.publish(envelope("same")).await.expect("publish");

    assert_eq!(rx.recv().await.unwrap().message.content, "same");
    assert_eq!(rx.recv().await.unwrap().message.content, "same");
}
