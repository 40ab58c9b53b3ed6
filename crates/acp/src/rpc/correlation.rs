//! Correlation table for outbound requests awaiting a response (spec.md §3
//! "Correlation entry", §4.2 "Outbound caller").

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::RpcError;
use crate::schema::jsonrpc::id_key;

type Slot = oneshot::Sender<std::result::Result<Value, RpcError>>;

/// Tracks outstanding outbound requests by the string-form of their id.
/// Insertion happens-before the request is written to the wire, so a
/// response (or even a same-tick cancellation) can never race ahead of its
/// slot existing (spec.md §4.2 step 1's happens-before requirement).
#[derive(Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<String, Slot>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending slot for `id`. Panics on reuse of a live id;
    /// the caller owns id allocation and must never reuse an id still in
    /// flight.
    pub fn insert(&self, id: &Value, sender: Slot) {
        let key = id_key(id);
        let previous = self.pending.lock().unwrap().insert(key.clone(), sender);
        debug_assert!(
            previous.is_none(),
            "reused a correlation id still in flight: {key}"
        );
    }

    /// Removes and returns the slot for `id`, if still pending. Used both by
    /// the reader task on response arrival and by local cancellation.
    pub fn take(&self, id: &Value) -> Option<Slot> {
        self.pending.lock().unwrap().remove(&id_key(id))
    }

    /// Drains every pending slot, used when the connection observes EOF or
    /// an I/O error so every outstanding caller unblocks with
    /// [`crate::error::Error::Disconnected`] instead of hanging forever.
    pub fn drain_all(&self) -> Vec<Slot> {
        self.pending.lock().unwrap().drain().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
