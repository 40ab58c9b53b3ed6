//! Ties framing, correlation, and dispatch together into the bidirectional
//! engine shared by [`crate::agent_side::AgentSideConnection`] and
//! [`crate::client_side::ClientSideConnection`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, RpcError};
use crate::rpc::correlation::CorrelationTable;
use crate::rpc::dispatcher::{self, Dispatch};
use crate::rpc::framing::{self, FramedReader};
use crate::schema::jsonrpc::{self, Classified};

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Spawner = Arc<dyn Fn(BoxFuture) + Send + Sync>;

/// A live bidirectional JSON-RPC connection: one writer task drains an
/// unbounded queue onto the outgoing stream, one reader task demultiplexes
/// the incoming stream into responses (resolved against the correlation
/// table) and requests/notifications (spawned onto `dispatcher`).
pub struct Connection<D> {
    writer_tx: mpsc::UnboundedSender<Value>,
    correlation: Arc<CorrelationTable>,
    next_id: AtomicU64,
    initialized: Arc<AtomicBool>,
    dispatcher: Arc<D>,
}

impl<D: Dispatch + 'static> Connection<D> {
    /// Builds the connection and its I/O driver future. The caller must poll
    /// the returned future to completion (typically via
    /// `tokio::task::spawn`) for the connection to make progress.
    pub fn new<R, W, S>(dispatcher: Arc<D>, outgoing: W, incoming: R, spawn: S) -> (Self, BoxFuture)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Fn(BoxFuture) + Send + Sync + 'static,
    {
        let (writer_tx, writer_rx) = mpsc::unbounded_channel::<Value>();
        let correlation = Arc::new(CorrelationTable::new());
        let initialized = Arc::new(AtomicBool::new(false));
        let spawn: Spawner = Arc::new(spawn);

        let writer_fut = writer_task(outgoing, writer_rx);
        let reader_fut = reader_task(
            incoming,
            writer_tx.clone(),
            correlation.clone(),
            dispatcher.clone(),
            spawn,
        );

        let io_future: BoxFuture = Box::pin(async move {
            tokio::select! {
                _ = writer_fut => {}
                _ = reader_fut => {}
            }
        });

        (
            Self {
                writer_tx,
                correlation,
                next_id: AtomicU64::new(1),
                initialized,
                dispatcher,
            },
            io_future,
        )
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends an outbound request and awaits its response. Every method
    /// besides `initialize` is rejected locally until
    /// [`Self::mark_initialized`] has been called, enforcing spec.md's
    /// "neither side may send any other request until initialize completes"
    /// invariant.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if method != crate::methods::INITIALIZE && !self.initialized.load(Ordering::Acquire) {
            return Err(Error::Rpc(RpcError::invalid_request(
                "cannot send requests before initialize completes",
            )));
        }
        self.call_unchecked(method, params).await
    }

    /// Like [`Self::call`], but bypasses the initialize gate. Used
    /// internally to send the `initialize` request itself.
    pub async fn call_unchecked(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.allocate_id();
        let id_value = Value::from(id);
        let (tx, rx) = oneshot::channel();
        self.correlation.insert(&id_value, tx);

        let message = jsonrpc::encode_request(id, method, params);
        self.writer_tx
            .send(message)
            .map_err(|_| Error::ConnectionClosed)?;

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(rpc_error)) => Err(Error::Rpc(rpc_error)),
            Err(_) => Err(Error::Disconnected),
        }
    }

    /// Sends an outbound request and races it against `cancel`, but never
    /// abandons the call: when `cancel` fires, `on_cancel` runs once as a
    /// side effect and the call keeps awaiting the peer's real response
    /// (spec.md §4.6 cancellation coupling: the caller "continues awaiting
    /// the response; it does not synthesize a local cancellation result").
    /// The correlation slot is only ever removed by the eventual response
    /// (or by the reader task on disconnect).
    pub async fn call_cancellable_with<F>(
        &self,
        method: &str,
        params: Value,
        cancel: CancellationToken,
        on_cancel: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Result<()>,
    {
        let id = self.allocate_id();
        let id_value = Value::from(id);
        let (tx, rx) = oneshot::channel();
        self.correlation.insert(&id_value, tx);

        let message = jsonrpc::encode_request(id, method, params);
        self.writer_tx
            .send(message)
            .map_err(|_| Error::ConnectionClosed)?;

        let mut on_cancel = Some(on_cancel);
        tokio::pin!(rx);
        loop {
            tokio::select! {
                result = &mut rx => {
                    return match result {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(rpc_error)) => Err(Error::Rpc(rpc_error)),
                        Err(_) => Err(Error::Disconnected),
                    };
                }
                _ = cancel.cancelled(), if on_cancel.is_some() => {
                    if let Some(hook) = on_cancel.take() {
                        hook()?;
                    }
                }
            }
        }
    }

    pub fn notify(&self, method: &str, params: Value) -> Result<()> {
        let message = jsonrpc::encode_notification(method, params);
        self.writer_tx
            .send(message)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Marks `initialize` as complete, lifting the request gate.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn dispatcher(&self) -> &Arc<D> {
        &self.dispatcher
    }
}

async fn writer_task<W>(mut outgoing: W, mut writer_rx: mpsc::UnboundedReceiver<Value>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = writer_rx.recv().await {
        if let Err(error) = framing::write_message(&mut outgoing, &message).await {
            tracing::warn!(%error, "writer task stopped: failed to write message");
            break;
        }
    }
}

async fn reader_task<R, D>(
    incoming: R,
    writer_tx: mpsc::UnboundedSender<Value>,
    correlation: Arc<CorrelationTable>,
    dispatcher: Arc<D>,
    spawn: Spawner,
) where
    R: AsyncRead + Unpin,
    D: Dispatch + 'static,
{
    let mut reader = FramedReader::new(incoming);
    loop {
        let message = match reader.next_message().await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(%error, "reader task stopped: transport error");
                break;
            }
        };

        match jsonrpc::classify(message) {
            Some(Classified::Response(response)) => {
                if let Some(slot) = correlation.take(&response.id) {
                    let resolved = match response.error {
                        Some(error) => Err(error),
                        None => Ok(response.result.unwrap_or(Value::Null)),
                    };
                    let _ = slot.send(resolved);
                }
            }
            Some(Classified::Request(request)) => {
                let writer_tx = writer_tx.clone();
                let dispatcher = dispatcher.clone();
                let id = request.id.clone();
                let id_key = jsonrpc::id_key(&request.id);
                spawn(Box::pin(async move {
                    let result = dispatcher::handle_request(
                        dispatcher.as_ref(),
                        &id_key,
                        &request.method,
                        request.params,
                    )
                    .await;
                    let message = jsonrpc::encode_response(id, result);
                    let _ = writer_tx.send(message);
                }));
            }
            Some(Classified::Notification(notification)) => {
                let dispatcher = dispatcher.clone();
                spawn(Box::pin(async move {
                    dispatcher::handle_notification(
                        dispatcher.as_ref(),
                        &notification.method,
                        notification.params,
                    )
                    .await;
                }));
            }
            None => {
                tracing::warn!("dropping message with neither method nor id");
            }
        }
    }

    // Drop every pending slot so outstanding callers observe
    // `Error::Disconnected` instead of hanging forever.
    for slot in correlation.drain_all() {
        drop(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullDispatch;

    #[async_trait]
    impl Dispatch for NullDispatch {
        async fn dispatch_request(
            &self,
            method: &str,
            _params: Value,
        ) -> std::result::Result<Value, RpcError> {
            Err(RpcError::method_not_found(method))
        }

        async fn dispatch_notification(&self, _method: &str, _params: Value) {}
    }

    fn spawn_on_current(future: BoxFuture) {
        tokio::task::spawn(future);
    }

    #[tokio::test]
    async fn call_is_rejected_before_initialize_completes() {
        let (client_io, agent_io) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_io);
        let (agent_read, agent_write) = tokio::io::split(agent_io);

        let (client, client_io_fut) = Connection::new(
            Arc::new(NullDispatch),
            client_write,
            client_read,
            spawn_on_current,
        );
        let (_agent, agent_io_fut) = Connection::new(
            Arc::new(NullDispatch),
            agent_write,
            agent_read,
            spawn_on_current,
        );
        tokio::spawn(client_io_fut);
        tokio::spawn(agent_io_fut);

        let error = client.call("session/prompt", Value::Null).await.unwrap_err();
        assert!(matches!(error, Error::Rpc(rpc) if rpc.code == crate::error::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn disconnect_resolves_pending_calls_as_disconnected() {
        let (client_io, agent_io) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client_io);
        drop(agent_io);

        let (client, client_io_fut) = Connection::new(
            Arc::new(NullDispatch),
            client_write,
            client_read,
            spawn_on_current,
        );
        client.mark_initialized();
        tokio::spawn(client_io_fut);

        let error = client.call("anything", Value::Null).await.unwrap_err();
        assert!(matches!(error, Error::Disconnected));
    }
}
