mod support;

use std::sync::Arc;
use std::time::Duration;

use rsocket_core::{ConnectionConfig, Payload};

#[tokio::test]
async fn round_trips_through_two_connected_peers() {
    let config = || ConnectionConfig::builder().build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(support::EchoRSocket),
        config(),
    );

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        client.request_response(Payload::from_data(&b"hello"[..])),
    )
    .await
    .expect("response within timeout")
    .expect("request succeeds");

    assert_eq!(response.data().unwrap().as_ref(), b"HELLO");
}

#[tokio::test]
async fn peer_error_surfaces_as_a_protocol_error() {
    struct RejectingRSocket;

    #[async_trait::async_trait]
    impl rsocket_core::RSocket for RejectingRSocket {
        async fn request_response(
            &self,
            _payload: Payload,
        ) -> Result<Payload, rsocket_core::ProtocolError> {
            Err(rsocket_core::ProtocolError::ApplicationError(
                "nope".into(),
            ))
        }
    }

    let config = || ConnectionConfig::builder().build().unwrap();
    let (client, _server) = support::spawn_pair(
        Arc::new(support::EchoRSocket),
        config(),
        Arc::new(RejectingRSocket),
        config(),
    );

    let err = tokio::time::timeout(
        Duration::from_secs(1),
        client.request_response(Payload::from_data(&b"hello"[..])),
    )
    .await
    .expect("reply within timeout")
    .expect_err("peer rejected the request");

    assert!(matches!(err, rsocket_core::ProtocolError::Peer { .. }));
}
