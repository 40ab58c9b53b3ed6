//! `session/update` notification payloads (spec.md §3 "Session update",
//! §4.6 "Streaming"). Agents push one of these per `SessionNotification`
//! while a `session/prompt` turn is in flight.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;
use super::plan::Plan;
use super::tool_call::{ToolCall, ToolCallUpdate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub content: ContentBlock,
}

impl ContentChunk {
    pub fn new(content: ContentBlock) -> Self {
        Self { content }
    }
}

/// The input a command expects, beyond its name. Currently only the
/// unstructured form (everything typed after the command name) exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum AvailableCommandInput {
    Unstructured { hint: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCommand {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<AvailableCommandInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCommandsUpdate {
    pub available_commands: Vec<AvailableCommand>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentModeUpdate {
    pub current_mode_id: String,
}

/// A tagged union keyed by `sessionUpdate` (spec.md §9 "Tagged unions on the
/// wire"), distinct from the `type` discriminator used elsewhere in the
/// schema because this is itself nested inside a `session/update`
/// notification's `update` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sessionUpdate", rename_all = "snake_case")]
pub enum SessionUpdate {
    UserMessageChunk(ContentChunk),
    AgentMessageChunk(ContentChunk),
    AgentThoughtChunk(ContentChunk),
    ToolCall(ToolCall),
    ToolCallUpdate(ToolCallUpdate),
    Plan(Plan),
    AvailableCommandsUpdate(AvailableCommandsUpdate),
    CurrentModeUpdate(CurrentModeUpdate),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_message_chunk_round_trips() {
        let update = SessionUpdate::AgentMessageChunk(ContentChunk::new(ContentBlock::text("hi")));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sessionUpdate"], "agent_message_chunk");
        let decoded: SessionUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn tool_call_variant_round_trips() {
        let update = SessionUpdate::ToolCall(ToolCall::new("call-1", "Read file"));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sessionUpdate"], "tool_call");
        assert_eq!(json["toolCallId"], "call-1");
    }

    #[test]
    fn current_mode_update_round_trips() {
        let update = SessionUpdate::CurrentModeUpdate(CurrentModeUpdate {
            current_mode_id: "architect".to_string(),
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sessionUpdate"], "current_mode_update");
        assert_eq!(json["currentModeId"], "architect");
        let decoded: SessionUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn available_command_with_unstructured_input_round_trips() {
        let command = AvailableCommand {
            name: "explain".to_string(),
            description: "Explain a file".to_string(),
            input: Some(AvailableCommandInput::Unstructured {
                hint: "path/to/file".to_string(),
            }),
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["input"]["hint"], "path/to/file");
        let decoded: AvailableCommand = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, command);
    }
}
