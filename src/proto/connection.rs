//! The connection engine: owns the transport, multiplexes the send and
//! receive pumps onto one task via `tokio::select!` (sidestepping two
//! concurrent `&mut` borrows of the same transport), dispatches inbound
//! frames to stream control or connection-level handling, and schedules
//! keepalive.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::{ConnectionConfig, LeasePublisher};
use crate::error::{ConnectionError, LocalError, ProtocolError, TransportError};
use crate::fragment::FragmentCache;
use crate::frame::{
    ErrorFrame, Frame, KeepaliveFrame, LeaseFrame, SetupFrame, StreamId,
};
use crate::handler::RSocket;
use crate::payload::Payload;
use crate::reactive::Publisher;
use crate::transport::Transport;

use super::shared::Shared;
use super::streams::{fire_and_forget, request_channel, request_response, request_stream};
use super::streams::{RequestChannelPublisher, RequestStreamPublisher};

/// Cheap-to-clone handle used by an embedder to issue outbound requests
/// while [`Connection::run`] drives the transport on its own task.
/// Mirrors the split between a connection driver and a request-issuing
/// handle that the teacher's handshake returns (`SendRequest` alongside
/// `Connection`).
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
}

impl ConnectionHandle {
    pub async fn request_response(&self, payload: Payload) -> Result<Payload, ProtocolError> {
        request_response::requester(self.shared.clone(), payload).await
    }

    pub fn request_fire_and_forget(&self, payload: Payload) -> Result<(), LocalError> {
        fire_and_forget::requester(&self.shared, payload)
    }

    pub fn request_stream(&self, payload: Payload) -> Box<dyn Publisher> {
        Box::new(RequestStreamPublisher::new(self.shared.clone(), payload))
    }

    pub fn request_channel(
        &self,
        payload: Payload,
        initial_request_n: u32,
        local_publisher: Option<Box<dyn Publisher>>,
    ) -> Box<dyn Publisher> {
        Box::new(RequestChannelPublisher::new(
            self.shared.clone(),
            payload,
            initial_request_n,
            local_publisher,
        ))
    }

    /// Idempotent.
    pub fn close(&self) {
        self.shared.mark_closed();
    }
}

pub struct Connection<T: Transport> {
    transport: T,
    config: ConnectionConfig,
    handler: Arc<dyn RSocket>,
    is_client: bool,
    shared: Arc<Shared>,
    outbound_rx: mpsc::UnboundedReceiver<Frame>,
    fragment_cache: FragmentCache,
}

impl<T: Transport> Connection<T> {
    pub fn new(
        transport: T,
        config: ConnectionConfig,
        handler: Arc<dyn RSocket>,
        is_client: bool,
    ) -> (ConnectionHandle, Self) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new(
            is_client,
            config.honor_lease,
            config.request_queue_size,
            outbound_tx,
        ));

        let handle = ConnectionHandle {
            shared: shared.clone(),
        };
        let connection = Connection {
            transport,
            config,
            handler,
            is_client,
            shared,
            outbound_rx,
            fragment_cache: FragmentCache::new(),
        };
        (handle, connection)
    }

    /// Drive the connection until the transport reaches end of stream, a
    /// fatal transport error occurs, or the peer is declared dead by the
    /// keepalive watchdog. Closes the transport before returning.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let Connection {
            mut transport,
            config,
            handler,
            is_client,
            shared,
            mut outbound_rx,
            mut fragment_cache,
        } = self;

        if is_client {
            let setup = build_setup_frame(&config);
            transport
                .send_frame(Frame::Setup(setup))
                .await
                .map_err(|e| ConnectionError::Transport(TransportError(Box::new(e))))?;
        }

        let mut keepalive_ticker = tokio::time::interval(config.keep_alive_interval);
        keepalive_ticker.tick().await; // first tick fires immediately; skip it
        let mut last_activity = Instant::now();

        let result = 'run: loop {
            if shared.is_closed() {
                break 'run Ok(());
            }

            tokio::select! {
                received = transport.recv_frame() => {
                    match received {
                        Ok(Some(frame)) => {
                            last_activity = Instant::now();
                            trace!(frame_type = ?frame.frame_type(), stream_id = %frame.stream_id(), "recv");
                            handle_inbound(&shared, &handler, &config, &mut fragment_cache, frame).await;
                        }
                        Ok(None) => break 'run Ok(()),
                        Err(e) => break 'run Err(ConnectionError::Transport(TransportError(Box::new(e)))),
                    }
                }
                Some(frame) = outbound_rx.recv() => {
                    let outgoing = match config.fragment_size {
                        Some(max) => crate::fragment::split(frame, max),
                        None => vec![frame],
                    };
                    for fragment in outgoing {
                        trace!(frame_type = ?fragment.frame_type(), stream_id = %fragment.stream_id(), "send");
                        if let Err(e) = transport.send_frame(fragment).await {
                            break 'run Err(ConnectionError::Transport(TransportError(Box::new(e))));
                        }
                    }
                    if outbound_rx.is_empty() {
                        if let Err(e) = transport.on_send_queue_empty().await {
                            break 'run Err(ConnectionError::Transport(TransportError(Box::new(e))));
                        }
                    }
                }
                _ = keepalive_ticker.tick() => {
                    if last_activity.elapsed() > config.max_lifetime {
                        warn!("peer exceeded max_lifetime with no activity; closing");
                        break 'run Err(ConnectionError::Protocol(ProtocolError::ApplicationError(
                            "peer declared dead by keepalive watchdog".into(),
                        )));
                    }
                    let _ = shared.send(Frame::Keepalive(KeepaliveFrame {
                        respond: true,
                        last_received_position: 0,
                        data: Bytes::new(),
                    }));
                }
            }
        };

        shared.mark_closed();
        let _ = transport.close().await;
        result
    }
}

fn build_setup_frame(config: &ConnectionConfig) -> SetupFrame {
    SetupFrame {
        major_version: crate::frame::MAJOR_VERSION,
        minor_version: crate::frame::MINOR_VERSION,
        keep_alive_interval_ms: config.keep_alive_interval.as_millis() as u32,
        max_lifetime_ms: config.max_lifetime.as_millis() as u32,
        resume_token: None,
        metadata_mime_type: config.metadata_mime_type.clone(),
        data_mime_type: config.data_mime_type.clone(),
        lease: config.honor_lease,
        payload: config.setup_payload.clone().unwrap_or_else(Payload::empty),
    }
}

fn spawn_lease_publisher(shared: Arc<Shared>, publisher: Arc<dyn LeasePublisher>) {
    let mut rx = publisher.subscribe();
    tokio::spawn(async move {
        while let Some((number_of_requests, ttl)) = rx.recv().await {
            shared.on_lease_granted(number_of_requests, ttl);
            let _ = shared.send(Frame::Lease(LeaseFrame {
                number_of_requests,
                ttl_ms: ttl.as_millis() as u32,
                metadata: None,
            }));
        }
    });
}

fn send_connection_error(shared: &Shared, stream_id: StreamId, error: ProtocolError) {
    let _ = shared.send(Frame::Error(ErrorFrame {
        stream_id,
        code: error.wire_code(),
        data: Bytes::from(error.to_string()),
    }));
}

async fn handle_inbound(
    shared: &Arc<Shared>,
    handler: &Arc<dyn RSocket>,
    config: &ConnectionConfig,
    fragment_cache: &mut FragmentCache,
    frame: Frame,
) {
    let stream_id = frame.stream_id();

    let frame = match fragment_cache.append(frame) {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(e) => {
            send_connection_error(shared, stream_id, e);
            return;
        }
    };

    match frame {
        Frame::Setup(setup) => handle_setup(shared, handler, config, setup).await,
        Frame::Lease(lease) => {
            shared.on_lease_received(lease.number_of_requests, Duration::from_millis(lease.ttl_ms as u64));
        }
        Frame::Keepalive(ka) => {
            if ka.respond {
                let _ = shared.send(Frame::Keepalive(KeepaliveFrame {
                    respond: false,
                    last_received_position: ka.last_received_position,
                    data: ka.data,
                }));
            }
        }
        Frame::MetadataPush(mp) => handler.on_metadata_push(mp.metadata).await,
        Frame::Resume(_) => {
            send_connection_error(shared, StreamId::CONNECTION, ProtocolError::RejectedResume);
            shared.mark_closed();
        }
        Frame::ResumeOk(_) => {
            debug!("ignoring unexpected ResumeOk; this core never sends Resume");
        }
        Frame::Error(ef) if ef.stream_id == StreamId::CONNECTION => {
            handler.on_error(ef.code, Payload::new(ef.data, None)).await;
        }
        Frame::RequestResponse(rf) => {
            if !shared.assert_available(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::StreamIdInUse(stream_id));
            } else if !shared.admit_inbound_initiate_request(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::LeaseExhausted(stream_id));
            } else {
                request_response::spawn_responder(shared.clone(), handler.clone(), stream_id, rf.payload);
            }
        }
        Frame::RequestFireAndForget(rf) => {
            if !shared.assert_available(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::StreamIdInUse(stream_id));
            } else if !shared.admit_inbound_initiate_request(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::LeaseExhausted(stream_id));
            } else {
                fire_and_forget::spawn_responder(handler.clone(), rf.payload);
            }
        }
        Frame::RequestStream(rf) => {
            let n = rf.initial_request_n.unwrap_or(0);
            if !shared.assert_available(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::StreamIdInUse(stream_id));
            } else if !shared.admit_inbound_initiate_request(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::LeaseExhausted(stream_id));
            } else {
                request_stream::spawn_responder(shared.clone(), handler.clone(), stream_id, rf.payload, n);
            }
        }
        Frame::RequestChannel(rf) => {
            let n = rf.initial_request_n.unwrap_or(0);
            if !shared.assert_available(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::StreamIdInUse(stream_id));
            } else if !shared.admit_inbound_initiate_request(stream_id) {
                send_connection_error(shared, stream_id, ProtocolError::LeaseExhausted(stream_id));
            } else {
                request_channel::spawn_responder(shared.clone(), handler.clone(), stream_id, rf.payload, n);
            }
        }
        other => route_to_stream(shared, stream_id, other).await,
    }
}

async fn route_to_stream(shared: &Arc<Shared>, stream_id: StreamId, frame: Frame) {
    match shared.sender_for(stream_id) {
        Some(sender) => {
            if sender.send(frame).await.is_err() {
                debug!(%stream_id, "stream handler task gone; dropping frame");
            }
        }
        None => debug!(%stream_id, "no handler registered; dropping frame"),
    }
}

async fn handle_setup(
    shared: &Arc<Shared>,
    handler: &Arc<dyn RSocket>,
    config: &ConnectionConfig,
    setup: SetupFrame,
) {
    if setup.lease && config.lease_publisher.is_none() {
        send_connection_error(shared, StreamId::CONNECTION, ProtocolError::UnsupportedSetup);
        shared.mark_closed();
        return;
    }

    match handler
        .on_setup(&setup.data_mime_type, &setup.metadata_mime_type, setup.payload)
        .await
    {
        Ok(()) => {
            if setup.lease {
                if let Some(publisher) = config.lease_publisher.clone() {
                    shared.enable_responder_lease();
                    spawn_lease_publisher(shared.clone(), publisher);
                }
            }
        }
        Err(message) => {
            send_connection_error(shared, StreamId::CONNECTION, ProtocolError::RejectedSetup(message));
            shared.mark_closed();
        }
    }
}
