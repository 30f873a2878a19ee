mod support;

use std::sync::Arc;
use std::time::Duration;

use rsocket_core::{ConnectionConfig, Payload};

use support::StreamEvent;

#[tokio::test]
async fn cancelling_a_stream_subscription_stops_further_delivery() {
    let config = || ConnectionConfig::builder().build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(support::EchoRSocket),
        config(),
    );

    let publisher = client.request_stream(Payload::from_data(&b"100"[..]));
    let (subscriber, mut events, subscription_rx) = support::ChannelSubscriber::new();
    tokio::spawn(publisher.subscribe(Box::new(subscriber)));

    let subscription = tokio::time::timeout(Duration::from_secs(1), subscription_rx)
        .await
        .expect("on_subscribe within timeout")
        .expect("subscription delivered");
    subscription.request(1);

    match tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("first item within timeout")
        .expect("channel open")
    {
        StreamEvent::Next(_, _) => {}
        other => panic!("expected Next, got {other:?}"),
    }

    subscription.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(
        events.try_recv().is_err(),
        "no further items should be delivered after cancel"
    );
}

#[tokio::test]
async fn an_uncancelled_stream_runs_to_completion() {
    let config = || ConnectionConfig::builder().build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(support::EchoRSocket),
        config(),
    );

    let publisher = client.request_stream(Payload::from_data(&b"3"[..]));
    let (subscriber, mut events, subscription_rx) = support::ChannelSubscriber::new();
    tokio::spawn(publisher.subscribe(Box::new(subscriber)));

    let subscription = tokio::time::timeout(Duration::from_secs(1), subscription_rx)
        .await
        .unwrap()
        .unwrap();
    subscription.request(10);

    let mut items = 0;
    loop {
        match tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
        {
            StreamEvent::Next(_, is_last) => {
                items += 1;
                if is_last {
                    break;
                }
            }
            StreamEvent::Complete => break,
            StreamEvent::Error(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(items, 3);
}
