//! Wire schema types for the Agent Client Protocol.

pub mod capabilities;
pub mod content;
pub mod jsonrpc;
pub mod methods;
pub mod plan;
pub mod session;
pub mod session_update;
pub mod tool_call;
pub mod version;

pub use capabilities::{
    AgentCapabilities, AuthMethod, ClientCapabilities, FileSystemCapability, Implementation,
    McpCapabilities, PromptCapabilities,
};
pub use content::{
    Annotations, AudioContent, BlobResourceContents, ContentBlock, EmbeddedResource, ImageContent,
    ResourceContent, ResourceLink, TextContent, TextResourceContents,
};
pub use methods::*;
pub use plan::{Plan, PlanEntry, PlanEntryPriority, PlanEntryStatus};
pub use session::{
    McpServerConfig, SessionConfigOption, SessionConfigOptionCategory, SessionConfigSelectOption,
    SessionId, SessionMode, SessionModel,
};
pub use session_update::{
    AvailableCommand, AvailableCommandInput, AvailableCommandsUpdate, ContentChunk,
    CurrentModeUpdate, SessionUpdate,
};
pub use tool_call::{
    Content, Diff, TerminalContent, ToolCall, ToolCallContent, ToolCallId, ToolCallLocation,
    ToolCallStatus, ToolCallUpdate, ToolCallUpdateFields, ToolKind,
};
pub use version::ProtocolVersion;
