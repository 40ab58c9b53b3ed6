//! The agent-facing half of the protocol: the [`Agent`] trait an
//! implementation fills in, and [`AgentSideConnection`], which drives a
//! [`Connection`] that routes inbound requests to it and exposes the
//! agent's outbound calls into the client.

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
    ReadTextFileRequest, ReadTextFileResponse, ReleaseTerminalRequest,
    RequestPermissionRequest, RequestPermissionResponse, SessionConfigOptionsNotification,
    SessionNotification, SetSessionConfigOptionRequest, SetSessionConfigOptionResponse, SetSessionModeRequest,
    SetSessionModeResponse, SetSessionModelRequest, SetSessionModelResponse,
    TerminalOutputRequest, TerminalOutputResponse, WaitForTerminalExitRequest,
    WaitForTerminalExitResponse, WriteTextFileRequest, WriteTextFileResponse,
};
use crate::session::TurnRegistry;

/// Implemented by an agent. Every method besides `initialize`/`new_session`/
/// `prompt` has a default body that rejects the call with
/// `method_not_found`, matching the capability-gated methods spec.md §4.6
/// marks optional (`load_session`, `set_session_model`, the config-option
/// extension).
#[async_trait]
pub trait Agent: Send + Sync {
    async fn initialize(&self, request: InitializeRequest) -> crate::error::Result<InitializeResponse>;

    async fn authenticate(&self, _request: AuthenticateRequest) -> crate::error::Result<()> {
        Err(Error::Rpc(RpcError::method_not_found(methods::AUTHENTICATE)))
    }

    async fn new_session(&self, request: NewSessionRequest) -> crate::error::Result<NewSessionResponse>;

    async fn load_session(&self, _request: LoadSessionRequest) -> crate::error::Result<LoadSessionResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::SESSION_LOAD)))
    }

    async fn prompt(&self, request: PromptRequest, cancel: CancellationToken) -> crate::error::Result<PromptResponse>;

    async fn set_session_mode(
        &self,
        _request: SetSessionModeRequest,
    ) -> crate::error::Result<SetSessionModeResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::SESSION_SET_MODE)))
    }

    /// Unstable: most agents will not implement model selection.
    async fn set_session_model(
        &self,
        _request: SetSessionModelRequest,
    ) -> crate::error::Result<SetSessionModelResponse> {
        Err(Error::Rpc(RpcError::method_not_found(methods::SESSION_SET_MODEL)))
    }

    async fn set_session_config_option(
        &self,
        _request: SetSessionConfigOptionRequest,
    ) -> crate::error::Result<SetSessionConfigOptionResponse> {
        Err(Error::Rpc(RpcError::method_not_found(
            methods::SESSION_SET_CONFIG_OPTION,
        )))
    }
}

struct AgentDispatch {
    agent: Arc<dyn Agent>,
    turns: Arc<TurnRegistry>,
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

#[async_trait]
impl Dispatch for AgentDispatch {
    async fn dispatch_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            methods::INITIALIZE => {
                let request: InitializeRequest = decode_params(params)?;
                let response = self.agent.initialize(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::AUTHENTICATE => {
                let request: AuthenticateRequest = decode_params(params)?;
                self.agent.authenticate(request).await.map_err(to_rpc)?;
                encode_result(Value::Object(Default::default()))
            }
            methods::SESSION_NEW => {
                let request: NewSessionRequest = decode_params(params)?;
                let response = self.agent.new_session(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::SESSION_LOAD => {
                let request: LoadSessionRequest = decode_params(params)?;
                let response = self.agent.load_session(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::SESSION_PROMPT => {
                let request: PromptRequest = decode_params(params)?;
                let cancel = self.turns.begin_turn(request.session_id.clone());
                let session_id = request.session_id.clone();
                let result = self.agent.prompt(request, cancel).await;
                self.turns.end_turn(&session_id);
                encode_result(result.map_err(to_rpc)?)
            }
            methods::SESSION_SET_MODE => {
                let request: SetSessionModeRequest = decode_params(params)?;
                let response = self.agent.set_session_mode(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::SESSION_SET_MODEL => {
                let request: SetSessionModelRequest = decode_params(params)?;
                let response = self.agent.set_session_model(request).await.map_err(to_rpc)?;
                encode_result(response)
            }
            methods::SESSION_SET_CONFIG_OPTION => {
                let request: SetSessionConfigOptionRequest = decode_params(params)?;
                let response = self
                    .agent
                    .set_session_config_option(request)
                    .await
                    .map_err(to_rpc)?;
                encode_result(response)
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    async fn dispatch_notification(&self, method: &str, params: Value) {
        if method == methods::SESSION_CANCEL {
            match decode_params::<CancelNotification>(params) {
                Ok(notification) => {
                    self.turns.cancel(&notification.session_id);
                }
                Err(error) => tracing::warn!(%error, "malformed session/cancel notification"),
            }
        } else {
            tracing::warn!(method, "unhandled inbound notification");
        }
    }
}

/// Drives one side of the protocol for an `Agent` implementation, and
/// exposes the agent's outbound calls into the client (`session/update`,
/// `session/request_permission`, `fs/*`, `terminal/*`).
pub struct AgentSideConnection {
    connection: Connection<AgentDispatch>,
}

impl AgentSideConnection {
    pub fn new<R, W, S>(agent: Arc<dyn Agent>, outgoing: W, incoming: R, spawn: S) -> (Self, BoxFuture)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Fn(BoxFuture) + Send + Sync + 'static,
    {
        let dispatch = Arc::new(AgentDispatch {
            agent,
            turns: Arc::new(TurnRegistry::new()),
        });
        let (connection, io_future) = Connection::new(dispatch, outgoing, incoming, spawn);
        (Self { connection }, io_future)
    }

    /// Must be called once the agent has returned its `InitializeResponse`;
    /// lifts the gate that otherwise rejects all other outbound calls.
    pub fn mark_initialized(&self) {
        self.connection.mark_initialized();
    }

    pub async fn session_update(&self, notification: SessionNotification) -> crate::error::Result<()> {
        let params = serde_json::to_value(notification).map_err(Error::Serialize)?;
        self.connection.notify(methods::SESSION_UPDATE, params)
    }

    /// Ambient extension, see [`crate::schema::SessionConfigOption`].
    pub async fn session_config_options(
        &self,
        notification: SessionConfigOptionsNotification,
    ) -> crate::error::Result<()> {
        let params = serde_json::to_value(notification).map_err(Error::Serialize)?;
        self.connection.notify(methods::SESSION_CONFIG_OPTIONS, params)
    }

    pub async fn request_permission(
        &self,
        request: RequestPermissionRequest,
    ) -> crate::error::Result<RequestPermissionResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::SESSION_REQUEST_PERMISSION, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn read_text_file(
        &self,
        request: ReadTextFileRequest,
    ) -> crate::error::Result<ReadTextFileResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::FS_READ_TEXT_FILE, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn write_text_file(
        &self,
        request: WriteTextFileRequest,
    ) -> crate::error::Result<WriteTextFileResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::FS_WRITE_TEXT_FILE, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn create_terminal(
        &self,
        request: CreateTerminalRequest,
    ) -> crate::error::Result<CreateTerminalResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::TERMINAL_CREATE, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn terminal_output(
        &self,
        request: TerminalOutputRequest,
    ) -> crate::error::Result<TerminalOutputResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::TERMINAL_OUTPUT, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn release_terminal(&self, request: ReleaseTerminalRequest) -> crate::error::Result<()> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        self.connection.call(methods::TERMINAL_RELEASE, params).await?;
        Ok(())
    }

    pub async fn wait_for_terminal_exit(
        &self,
        request: WaitForTerminalExitRequest,
    ) -> crate::error::Result<WaitForTerminalExitResponse> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        let value = self.connection.call(methods::TERMINAL_WAIT_FOR_EXIT, params).await?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub async fn kill_terminal_command(&self, request: KillTerminalCommandRequest) -> crate::error::Result<()> {
        let params = serde_json::to_value(request).map_err(Error::Serialize)?;
        self.connection.call(methods::TERMINAL_KILL, params).await?;
        Ok(())
    }
}

