//! End-to-end protocol flows driven over an in-memory duplex transport.
//! This crate owns no process spawning, so `tokio::io::duplex` stands in
//! for a child process's stdio.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_client_protocol::{
    Agent, AgentSideConnection, BoxFuture, Client, ClientSideConnection, ContentBlock,
    CreateTerminalRequest, CreateTerminalResponse, Implementation, InitializeRequest,
    InitializeResponse, LoadSessionRequest, LoadSessionResponse, NewSessionRequest,
    NewSessionResponse, PermissionOption, PermissionOptionKind, ProtocolVersion, PromptRequest,
    PromptResponse, ReadTextFileRequest, ReadTextFileResponse, RequestPermissionOutcome,
    RequestPermissionRequest, RequestPermissionResponse, SelectedPermissionOutcome,
    SessionConfigOptionsNotification, SessionId, SessionNotification,
    SetSessionConfigOptionRequest, SetSessionConfigOptionResponse, SessionUpdate, StopReason,
    WriteTextFileRequest, WriteTextFileResponse,
};
use tokio_util::sync::CancellationToken;

fn spawn_on_current(future: BoxFuture) {
    tokio::task::spawn(future);
}

struct EchoAgent {
    observed_cancel: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl Agent for EchoAgent {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> agent_client_protocol::Result<InitializeResponse> {
        Ok(InitializeResponse::new(request.protocol_version))
    }

    async fn new_session(
        &self,
        request: NewSessionRequest,
    ) -> agent_client_protocol::Result<NewSessionResponse> {
        Ok(NewSessionResponse::new(format!("session-for-{}", request.cwd)))
    }

    async fn load_session(
        &self,
        request: LoadSessionRequest,
    ) -> agent_client_protocol::Result<LoadSessionResponse> {
        let _ = request;
        Ok(LoadSessionResponse::default())
    }

    async fn prompt(
        &self,
        _request: PromptRequest,
        cancel: CancellationToken,
    ) -> agent_client_protocol::Result<PromptResponse> {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(5)) => {
                Ok(PromptResponse::new(StopReason::EndTurn))
            }
            _ = cancel.cancelled() => {
                self.observed_cancel.store(true, Ordering::SeqCst);
                Ok(PromptResponse::new(StopReason::Cancelled))
            }
        }
    }

    async fn set_session_config_option(
        &self,
        request: agent_client_protocol::SetSessionConfigOptionRequest,
    ) -> agent_client_protocol::Result<SetSessionConfigOptionResponse> {
        let _ = request;
        Ok(SetSessionConfigOptionResponse::default())
    }
}

#[derive(Default)]
struct RecordingClient {
    updates: Mutex<Vec<SessionNotification>>,
    config_options: Mutex<Vec<SessionConfigOptionsNotification>>,
    files: Mutex<std::collections::HashMap<String, String>>,
}

#[async_trait::async_trait]
impl Client for RecordingClient {
    async fn session_notification(
        &self,
        notification: SessionNotification,
    ) -> agent_client_protocol::Result<()> {
        self.updates.lock().unwrap().push(notification);
        Ok(())
    }

    async fn session_config_options(
        &self,
        notification: SessionConfigOptionsNotification,
    ) -> agent_client_protocol::Result<()> {
        self.config_options.lock().unwrap().push(notification);
        Ok(())
    }

    async fn request_permission(
        &self,
        request: RequestPermissionRequest,
    ) -> agent_client_protocol::Result<RequestPermissionResponse> {
        let first = request.options.first().cloned().expect("at least one option");
        Ok(RequestPermissionResponse {
            outcome: RequestPermissionOutcome::Selected(SelectedPermissionOutcome::new(
                first.option_id,
            )),
        })
    }

    async fn read_text_file(
        &self,
        request: ReadTextFileRequest,
    ) -> agent_client_protocol::Result<ReadTextFileResponse> {
        let files = self.files.lock().unwrap();
        let content = files.get(&request.path).cloned().unwrap_or_default();
        Ok(ReadTextFileResponse { content })
    }

    async fn write_text_file(
        &self,
        request: WriteTextFileRequest,
    ) -> agent_client_protocol::Result<WriteTextFileResponse> {
        self.files
            .lock()
            .unwrap()
            .insert(request.path, request.content);
        Ok(WriteTextFileResponse::default())
    }

    async fn create_terminal(
        &self,
        _request: CreateTerminalRequest,
    ) -> agent_client_protocol::Result<CreateTerminalResponse> {
        Ok(CreateTerminalResponse {
            terminal_id: "term-1".to_string(),
        })
    }
}

struct Harness {
    agent_connection: Arc<AgentSideConnection>,
    client_connection: Arc<ClientSideConnection>,
    observed_cancel: Arc<AtomicBool>,
    client: Arc<RecordingClient>,
}

async fn build_harness() -> Harness {
    let (client_io, agent_io) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (agent_read, agent_write) = tokio::io::split(agent_io);

    let observed_cancel = Arc::new(AtomicBool::new(false));
    let agent = Arc::new(EchoAgent {
        observed_cancel: observed_cancel.clone(),
    });
    let client = Arc::new(RecordingClient::default());

    let (agent_connection, agent_io_future) =
        AgentSideConnection::new(agent, agent_write, agent_read, spawn_on_current);
    agent_connection.mark_initialized();

    let (client_connection, client_io_future) =
        ClientSideConnection::new(client.clone(), client_write, client_read, spawn_on_current);

    tokio::spawn(agent_io_future);
    tokio::spawn(client_io_future);

    Harness {
        agent_connection: Arc::new(agent_connection),
        client_connection: Arc::new(client_connection),
        observed_cancel,
        client,
    }
}

#[tokio::test]
async fn handshake_then_new_session_then_prompt() {
    let harness = build_harness().await;

    let init = harness
        .client_connection
        .initialize(
            InitializeRequest::new(ProtocolVersion::LATEST)
                .client_info(Implementation::new("test-client", "0.1.0")),
        )
        .await
        .unwrap();
    assert_eq!(init.protocol_version, ProtocolVersion::LATEST);

    let session = harness
        .client_connection
        .new_session(NewSessionRequest::new("/workspace"))
        .await
        .unwrap();
    assert_eq!(session.session_id, SessionId::new("session-for-/workspace"));

    let response = harness
        .client_connection
        .prompt(
            PromptRequest::new(session.session_id, vec![ContentBlock::text("hello")]),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.stop_reason, StopReason::EndTurn);
}

#[tokio::test]
async fn local_cancellation_stops_the_turn_and_notifies_the_agent() {
    let harness = build_harness().await;
    harness
        .client_connection
        .initialize(InitializeRequest::new(ProtocolVersion::LATEST))
        .await
        .unwrap();
    let session = harness
        .client_connection
        .new_session(NewSessionRequest::new("/workspace"))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel_clone.cancel();
    });

    let response = harness
        .client_connection
        .prompt(
            PromptRequest::new(session.session_id, vec![ContentBlock::text("hi")]),
            cancel,
        )
        .await
        .unwrap();
    assert_eq!(response.stop_reason, StopReason::Cancelled);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.observed_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn permission_request_round_trips_through_the_client() {
    let harness = build_harness().await;
    let response = harness
        .agent_connection
        .request_permission(RequestPermissionRequest::new(
            "sess-1",
            "call-1",
            vec![PermissionOption {
                option_id: "allow".to_string(),
                name: "Allow".to_string(),
                kind: PermissionOptionKind::AllowOnce,
            }],
        ))
        .await
        .unwrap();
    assert_eq!(
        response.outcome,
        RequestPermissionOutcome::Selected(SelectedPermissionOutcome::new("allow"))
    );
}

#[tokio::test]
async fn fs_round_trip_through_the_client() {
    let harness = build_harness().await;
    harness
        .agent_connection
        .write_text_file(WriteTextFileRequest {
            session_id: SessionId::new("sess-1"),
            path: "/tmp/note.txt".to_string(),
            content: "hello from the agent".to_string(),
        })
        .await
        .unwrap();

    let read = harness
        .agent_connection
        .read_text_file(ReadTextFileRequest {
            session_id: SessionId::new("sess-1"),
            path: "/tmp/note.txt".to_string(),
            line: None,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(read.content, "hello from the agent");
}

#[tokio::test]
async fn session_update_notifications_reach_the_client() {
    let harness = build_harness().await;
    harness
        .agent_connection
        .session_update(SessionNotification::new(
            "sess-1",
            SessionUpdate::AgentMessageChunk(agent_client_protocol::ContentChunk::new(
                ContentBlock::text("partial output"),
            )),
        ))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let updates = harness.client.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].session_id, SessionId::new("sess-1"));
}

#[tokio::test]
async fn set_session_config_option_round_trips_through_the_agent() {
    let harness = build_harness().await;
    harness
        .client_connection
        .initialize(InitializeRequest::new(ProtocolVersion::LATEST))
        .await
        .unwrap();

    harness
        .client_connection
        .set_session_config_option(SetSessionConfigOptionRequest {
            session_id: SessionId::new("sess-1"),
            option_id: "verbosity".to_string(),
            value: "high".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn session_config_options_notifications_reach_the_client() {
    let harness = build_harness().await;
    harness
        .agent_connection
        .session_config_options(SessionConfigOptionsNotification {
            session_id: SessionId::new("sess-1"),
            options: vec![agent_client_protocol::SessionConfigOption {
                id: "verbosity".to_string(),
                name: "Verbosity".to_string(),
                category: agent_client_protocol::SessionConfigOptionCategory::Other,
                options: vec![agent_client_protocol::SessionConfigSelectOption {
                    id: "high".to_string(),
                    name: "High".to_string(),
                }],
                current_value: None,
            }],
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let received = harness.client.config_options.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].session_id, SessionId::new("sess-1"));
}

#[tokio::test]
async fn unsupported_optional_method_surfaces_method_not_found() {
    let harness = build_harness().await;
    harness
        .client_connection
        .initialize(InitializeRequest::new(ProtocolVersion::LATEST))
        .await
        .unwrap();
    let error = harness
        .client_connection
        .set_session_model(agent_client_protocol::SetSessionModelRequest {
            session_id: SessionId::new("sess-1"),
            model_id: "gpt-x".to_string(),
        })
        .await
        .unwrap_err();
    match error {
        agent_client_protocol::Error::Rpc(rpc) => {
            assert_eq!(rpc.code, agent_client_protocol::error::METHOD_NOT_FOUND);
        }
        other => panic!("expected an RpcError, got {other:?}"),
    }
}
