//! The connection engine and its supporting stream-table, lease, and
//! fragment-reassembly state. [`connection::Connection`] is the only
//! piece an embedder touches directly; everything else here is internal
//! wiring reached through it.

mod connection;
mod lease_accounting;
mod shared;
mod store;
mod stream_id;
mod streams;

pub use connection::{Connection, ConnectionHandle};
