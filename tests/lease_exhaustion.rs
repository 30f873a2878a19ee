mod support;

use std::sync::Arc;
use std::time::Duration;

use rsocket_core::{ConnectionConfig, Payload};

#[tokio::test]
async fn requests_queue_until_a_lease_is_granted_and_drain_fifo() {
    let (lease_publisher, lease_tx) = support::test_lease_publisher();

    let client_config = ConnectionConfig::builder().honor_lease(true).build().unwrap();
    let server_config = ConnectionConfig::builder()
        .lease_publisher(lease_publisher)
        .build()
        .unwrap();

    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        client_config,
        Arc::new(support::EchoRSocket),
        server_config,
    );

    // No lease has been granted yet, so the request sits queued rather
    // than failing or going out unchecked.
    let first = {
        let client = client.clone();
        tokio::spawn(async move { client.request_response(Payload::from_data(&b"a"[..])).await })
    };
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!first.is_finished(), "request should be queued without a lease");

    lease_tx.send((1, Duration::from_secs(30))).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), first)
        .await
        .expect("task completes")
        .expect("task did not panic");
    assert_eq!(result.unwrap().data().unwrap().as_ref(), b"A");

    // The single-request lease is now spent; a second request queues
    // again until another lease arrives.
    let second = {
        let client = client.clone();
        tokio::spawn(async move { client.request_response(Payload::from_data(&b"b"[..])).await })
    };
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!second.is_finished(), "second request should queue after the lease is spent");

    lease_tx.send((1, Duration::from_secs(30))).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), second)
        .await
        .expect("task completes")
        .expect("task did not panic");
    assert_eq!(result.unwrap().data().unwrap().as_ref(), b"B");
}
