//! The client-facing half of the protocol: the [`Client`] trait an
//! implementation fills in, and [`ClientSideConnection`], which drives a
//! [`Connection`] that routes inbound requests to it and exposes the
//! client's outbound calls into the agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, RpcError};
use crate::methods;
use crate::rpc::{BoxFuture, Connection, Dispatch};
use crate::schema::{
    AuthenticateRequest, CancelNotification, CreateTerminalRequest, CreateTerminalResponse,
    InitializeRequest, InitializeResponse, KillTerminalCommandRequest, LoadSessionRequest,
    LoadSessionResponse, NewSessionRequest, NewSessionResponse, PromptRequest, PromptResponse,
    ReadTextFileRequest, ReadTextFileResponse, ReleaseTerminalRequest, RequestPermissionRequest,
    RequestPermissionResponse, SessionConfigOptionsNotification, SessionNotification,
    SetSessionConfigOptionRequest, SetSessionConfigOptionResponse, SetSessionModeRequest,
    SetSessionModeResponse, SetSessionModelRequest, SetSessionModelResponse,
    TerminalOutputRequest, TerminalOutputResponse, WaitForTerminalExitRequest,
    WaitForTerminalExitResponse, WriteTextFileRequest, WriteTextFileResponse,
};

/// Implemented by a client (editor, IDE, CLI host). `session_notification`
/// and `request_permission` are the only methods every client must handle;
/// `fs/*`/`terminal/*` default to `method_not_found` for clients that never
/// advertised the matching capability at `initialize`.
#[async_trait]
pub trait Client: Send + Sync {
    async fn session_notification(&self, notification: SessionNotification) -> crate::error::Result<()>;

    /// Ambient extension, see [`crate::schema::SessionConfigOption`]. Most
    /// clients that never advertise config-option support can ignore this.
    async fn session_config_options(
        &self,
        _notification: SessionConfigOptionsNotification,
    ) -> crate::error::Result<()> {
        Ok(())
    }

    async fn request_permission(
        &self,
        request: RequestPermissionRequest,
    ) -> crate::error::Result<RequestPermissionResponse>;

    async fn read_text_file(&self, _request: ReadTextFileRequest) -> crate::error::Result<ReadTextFileResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::FS_READ_TEXT_FILE)))
    }

    async fn write_text_file(&self, _request: WriteTextFileRequest) -> crate::error::Result<WriteTextFileResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::FS_WRITE_TEXT_FILE)))
    }

    async fn create_terminal(&self, _request: CreateTerminalRequest) -> crate::error::Result<CreateTerminalResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::TERMINAL_CREATE)))
    }

    async fn terminal_output(&self, _request: TerminalOutputRequest) -> crate::error::Result<TerminalOutputResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::TERMINAL_OUTPUT)))
    }

    async fn release_terminal(&self, _request: ReleaseTerminalRequest) -> crate::error::Result<()> {
        Err(Error::Rpc(RpcError::method_not_found(methods::TERMINAL_RELEASE)))
    }

    async fn wait_for_terminal_exit(
        &self,
        _request: WaitForTerminalExitRequest,
    ) -> crate::error::Result<WaitForTerminalExitResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::TERMINAL_WAIT_FOR_EXIT)))
    }

    async fn kill_terminal_command(&self, _request: KillTerminalCommandRequest) -> crate::error::Result<()> {
        Err(Error::Rpc(RpcError::method_not_found(methods::TERMINAL_KILL)))
    }
}

struct ClientDispatch {
    client: Arc<dyn Client>,
}

fn to_rpc(error: Error) -> RpcError {
    error.into_rpc_error()
}

fn decode_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|error| RpcError::invalid_params(error.to_string()))
}

fn encode_result<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|error| RpcError::internal(error.to_string()))
}

fn encode_unit_result() -> Result<Value, RpcError> {
    Ok(Value::Object(Default::default()))
}

#[async_trait]
impl Dispatch for ClientDispatch {
    async fn dispatch_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            methods::SESSION_REQUEST_PERMISSION => {
                let request: RequestPermissionRequest = decode_params(params)?;
                let response = self.client.request_permission(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::FS_READ_TEXT_FILE => {
                let request: ReadTextFileRequest = decode_params(params)?;
                let response = self.client.read_text_file(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::FS_WRITE_TEXT_FILE => {
                let request: WriteTextFileRequest = decode_params(params)?;
                let response = self.client.write_text_file(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::TERMINAL_CREATE => {
                let request: CreateTerminalRequest = decode_params(params)?;
                let response = self.client.create_terminal(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::TERMINAL_OUTPUT => {
                let request: TerminalOutputRequest = decode_params(params)?;
                let response = self.client.terminal_output(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::TERMINAL_RELEASE => {
                let request: ReleaseTerminalRequest = decode_params(params)?;
                self.client.release_terminal(request).await.map_err(to_rpc)?;
                encode_unit_result()
            }
            methods::TERMINAL_WAIT_FOR_EXIT => {
                let request: WaitForTerminalExitRequest = decode_params(params)?;
                let response = self.client.wait_for_terminal_exit(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::TERMINAL_KILL => {
                let request: KillTerminalCommandRequest = decode_params(params)?;
                self.client.kill_terminal_command(request).await.map_err(to_rpc)?;
                encode_unit_result()
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    async fn dispatch_notification(&self, method: &str, params: Value) {
        match method {
            methods::SESSION_UPDATE => match decode_params::<SessionNotification>(params) {
                Ok(notification) => {
                    if let Err(error) = self.client.session_notification(notification).await {
                        tracing::warn!(%error, "client failed to handle session/update");
                    }
                }
                Err(error) => tracing::warn!(%error, "malformed session/update notification"),
            },
            methods::SESSION_CONFIG_OPTIONS => {
                match decode_params::<SessionConfigOptionsNotification>(params) {
                    Ok(notification) => {
                        if let Err(error) = self.client.session_config_options(notification).await {
                            tracing::warn!(%error, "client failed to handle session/config_options");
                        }
                    }
                    Err(error) => {
                        tracing::warn!(%error, "malformed session/config_options notification")
                    }
                }
            }
            other => tracing::warn!(method = other, "unhandled inbound notification"),
        }
    }
}

/// Drives one side of the protocol for a `Client` implementation, and
/// exposes the client's outbound calls into the agent (`initialize` through
/// `session/prompt`).
pub struct ClientSideConnection {
    connection: Connection<ClientDispatch>,
}

impl ClientSideConnection {
    pub fn new<R, W, S>(client: Arc<dyn Client>, outgoing: W, incoming: R, spawn: S) -> (Self, BoxFuture)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Fn(BoxFuture) + Send + Sync + 'static,
    {
        let dispatch = Arc::new(ClientDispatch { client });
        let (connection, io_future) = Connection::new(dispatch, outgoing, incoming, spawn);
        (Self { connection }, io_future)
    }

    pub async fn initialize(&self, request: InitializeRequest) -> crate::error::Result<InitializeResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call_unchecked(methods::INITIALIZE, params).await?;
        let response: InitializeResponse = serde_json::from_value(value).map_err(Error::Decode)?;
        self.connection.mark_initialized();
        Ok(response)
    }

    pub async fn authenticate(&self, request: AuthenticateRequest) -> crate::error::Result<()> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        self.connection.call(methods::AUTHENTICATE, params).await?;
        Ok(())
    }

    pub async fn new_session(&self, request: NewSessionRequest) -> crate::error::Result<NewSessionResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::SESSION_NEW, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn load_session(&self, request: LoadSessionRequest) -> crate::error::Result<LoadSessionResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::SESSION_LOAD, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    /// Sends `session/prompt` and races it against local cancellation. If
    /// `cancel` fires first, a `session/cancel` notification is sent for
    /// this prompt's session (spec.md §4.6 cancellation coupling item 2:
    /// "the caller... sends `session/cancel` for that session"), but the
    /// call keeps awaiting the agent's real response rather than
    /// synthesizing one locally.
    pub async fn prompt(
        &self,
        request: PromptRequest,
        cancel: CancellationToken,
    ) -> crate::error::Result<PromptResponse> {
        let session_id = request.session_id.clone();
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self
            .connection
            .call_cancellable_with(methods::SESSION_PROMPT, params, cancel, || {
                self.cancel(CancelNotification::new(session_id.clone()))
            })
            .await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub fn cancel(&self, notification: CancelNotification) -> crate::error::Result<()> {
        let params = serde_json::to_value(notification).map_err(Error::Serialize)?;
        self.connection.notify(methods::SESSION_CANCEL, params)
    }

    pub async fn set_session_mode(
        &self,
        request: SetSessionModeRequest,
    ) -> crate::error::Result<SetSessionModeResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::SESSION_SET_MODE, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    /// Unstable: most agents will not implement model selection.
    pub async fn set_session_model(
        &self,
        request: SetSessionModelRequest,
    ) -> crate::error::Result<SetSessionModelResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::SESSION_SET_MODEL, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    /// Ambient extension, see [`crate::schema::SessionConfigOption`].
    pub async fn set_session_config_option(
        &self,
        request: SetSessionConfigOptionRequest,
    ) -> crate::error::Result<SetSessionConfigOptionResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self
            .connection
            .call(methods::SESSION_SET_CONFIG_OPTION, params)
            .await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }
}
