//! The transport-agnostic JSON-RPC engine: framing, correlation, dispatch,
//! and the bidirectional connection built from them.

pub mod connection;
pub mod correlation;
pub mod dispatcher;
pub mod framing;

pub use connection::{BoxFuture, Connection, Spawner};
pub use correlation::CorrelationTable;
pub use dispatcher::Dispatch;
