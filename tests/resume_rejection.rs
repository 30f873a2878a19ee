mod support;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use rsocket_core::{Connection, ConnectionConfig, ErrorCode, Frame, ResumeFrame, StreamId, Transport};

#[tokio::test]
async fn resume_is_always_rejected_and_closes_the_connection() {
    let (mut probe, transport) = support::DuplexTransport::pair();
    let config = ConnectionConfig::builder().build().unwrap();
    let (_handle, conn) = Connection::new(transport, config, Arc::new(support::EchoRSocket), false);
    let run = tokio::spawn(conn.run());

    probe
        .send_frame(Frame::Resume(ResumeFrame {
            major_version: 1,
            minor_version: 0,
            resume_token: Bytes::from_static(b"tok"),
            last_received_server_position: 0,
            first_available_client_position: 0,
        }))
        .await
        .unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(1), probe.recv_frame())
        .await
        .expect("reply within timeout")
        .unwrap()
        .expect("at least one frame before close");

    match reply {
        Frame::Error(ef) => {
            assert_eq!(ef.stream_id, StreamId::CONNECTION);
            assert_eq!(ef.code, ErrorCode::RejectedResume);
        }
        other => panic!("expected a connection-level Error, got {other:?}"),
    }

    tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("run() returns after the connection is marked closed")
        .expect("run() did not panic")
        .expect("closing after a rejected resume is not itself an error");
}
