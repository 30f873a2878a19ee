//! Per-interaction-model requester/responder state machines. Each
//! module owns both halves of one interaction model; the connection
//! engine calls into the `requester`/`spawn_responder` entry points and
//! otherwise never touches stream internals directly.

mod outbound_adapter;

pub mod fire_and_forget;
pub mod request_channel;
pub mod request_response;
pub mod request_stream;

pub use request_channel::RequestChannelPublisher;
pub use request_stream::RequestStreamPublisher;
