mod support;

use std::sync::Arc;
use std::time::Duration;

use rsocket_core::{ConnectionConfig, Payload};

#[tokio::test]
async fn large_payloads_are_fragmented_and_reassembled_transparently() {
    let config = || ConnectionConfig::builder().fragment_size(16).build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(support::EchoRSocket),
        config(),
    );

    let big = vec![b'x'; 500];
    let response = tokio::time::timeout(
        Duration::from_secs(1),
        client.request_response(Payload::new(big.clone(), Some(bytes::Bytes::from_static(b"route")))),
    )
    .await
    .expect("response within timeout")
    .expect("request succeeds");

    let expected: Vec<u8> = big.iter().map(u8::to_ascii_uppercase).collect();
    assert_eq!(response.data().unwrap().as_ref(), expected.as_slice());
}

#[tokio::test]
async fn small_payloads_are_unaffected_by_a_fragment_size_limit() {
    let config = || ConnectionConfig::builder().fragment_size(4096).build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(support::EchoRSocket),
        config(),
    );

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        client.request_response(Payload::from_data(&b"hi"[..])),
    )
    .await
    .expect("response within timeout")
    .expect("request succeeds");

    assert_eq!(response.data().unwrap().as_ref(), b"HI");
}
