#![forbid(unsafe_code)]
//! A bidirectional JSON-RPC engine and protocol state machine for the Agent
//! Client Protocol (ACP): a wire protocol between a Client (an editor, IDE,
//! or CLI host) and an Agent (a coding assistant), carried as
//! newline-delimited JSON-RPC 2.0 over a byte-stream transport the host
//! application owns.
//!
//! This crate does not spawn processes or own a transport. Callers provide
//! an `AsyncRead`/`AsyncWrite` pair — typically a child process's stdio, or
//! an in-process pipe for tests — and this crate turns it into a live
//! connection.
//!
//! ## Agent side
//! Implement [`Agent`], then drive it with [`AgentSideConnection`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_client_protocol::{Agent, AgentSideConnection, InitializeRequest, InitializeResponse};
//! use agent_client_protocol::{NewSessionRequest, NewSessionResponse, PromptRequest, PromptResponse, StopReason};
//! use tokio_util::sync::CancellationToken;
//!
//! struct MyAgent;
//!
//! #[async_trait::async_trait]
//! impl Agent for MyAgent {
//!     async fn initialize(&self, request: InitializeRequest) -> agent_client_protocol::Result<InitializeResponse> {
//!         Ok(InitializeResponse::new(request.protocol_version))
//!     }
//!
//!     async fn new_session(&self, request: NewSessionRequest) -> agent_client_protocol::Result<NewSessionResponse> {
//!         Ok(NewSessionResponse::new(format!("session-for-{}", request.cwd)))
//!     }
//!
//!     async fn prompt(&self, _request: PromptRequest, _cancel: CancellationToken) -> agent_client_protocol::Result<PromptResponse> {
//!         Ok(PromptResponse::new(StopReason::EndTurn))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stdin = tokio::io::stdin();
//! let stdout = tokio::io::stdout();
//! let (connection, io_task) = AgentSideConnection::new(
//!     Arc::new(MyAgent),
//!     stdout,
//!     stdin,
//!     |future| { tokio::task::spawn(future); },
//! );
//! connection.mark_initialized();
//! tokio::spawn(io_task);
//! # Ok(()) }
//! ```
//!
//! ## Client side
//! Implement [`Client`], then drive it with [`ClientSideConnection`], which
//! also exposes the outbound calls (`initialize`, `session/new`,
//! `session/prompt`, ...) a client makes into the agent.
//!
//! ## Modules
//! - [`schema`] — wire types: content blocks, tool calls, plans, session
//!   updates, and every method's request/response pair.
//! - [`rpc`] — the transport-agnostic engine: framing, correlation,
//!   dispatch, and [`rpc::Connection`].
//! - [`methods`] — JSON-RPC method name constants.
//! - [`error`] — the wire-facing [`error::RpcError`] and the broader
//!   [`error::Error`] covering local-only failure modes.

pub mod agent_side;
pub mod client_side;
pub mod error;
pub mod methods;
pub mod rpc;
pub mod schema;
pub mod session;

pub use agent_side::{Agent, AgentSideConnection};
pub use client_side::{Client, ClientSideConnection};
pub use error::{Error, Result, RpcError};
pub use rpc::{BoxFuture, Connection};
pub use schema::*;
pub use session::TurnRegistry;
