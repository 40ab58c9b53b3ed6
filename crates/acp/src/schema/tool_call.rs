//! Tool call reporting (spec.md §3 "Tool call"). Agents report tool
//! execution progress to the client via `session/update` notifications
//! carrying `ToolCall`/`ToolCallUpdate` payloads.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct ToolCallId(pub String);

impl ToolCallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<String> for ToolCallId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ToolCallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A coarse classification of what a tool does, used by clients to pick an
/// icon/label. Inferred by the agent from the tool name; never authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Read,
    Edit,
    Delete,
    Move,
    Search,
    Execute,
    Think,
    Fetch,
    SwitchMode,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallLocation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub content: ContentBlock,
}

impl Content {
    pub fn new(content: ContentBlock) -> Self {
        Self { content }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub path: String,
    pub old_text: Option<String>,
    pub new_text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalContent {
    pub terminal_id: String,
}

/// Content attached to a tool call update, a tagged union keyed by `type`
/// (spec.md §9 "Tagged unions on the wire").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallContent {
    Content(Content),
    Diff(Diff),
    Terminal(TerminalContent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: ToolCallId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    #[serde(default)]
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ToolCallContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ToolCallLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<serde_json::Value>,
}

impl ToolCall {
    pub fn new(tool_call_id: impl Into<ToolCallId>, title: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            title: title.into(),
            kind: None,
            status: ToolCallStatus::default(),
            raw_input: None,
            content: Vec::new(),
            locations: Vec::new(),
            raw_output: None,
        }
    }

    pub fn kind(mut self, kind: ToolKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: ToolCallStatus) -> Self {
        self.status = status;
        self
    }

    pub fn raw_input(mut self, raw_input: serde_json::Value) -> Self {
        self.raw_input = Some(raw_input);
        self
    }

    pub fn content(mut self, content: Vec<ToolCallContent>) -> Self {
        self.content = content;
        self
    }

    pub fn raw_output(mut self, raw_output: serde_json::Value) -> Self {
        self.raw_output = Some(raw_output);
        self
    }
}

/// A partial update to a previously reported tool call. Every field besides
/// `tool_call_id` is optional; absent fields leave the client's existing
/// record unchanged (spec.md §3 "Tool call update — merge semantics").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallUpdate {
    pub tool_call_id: ToolCallId,
    #[serde(flatten)]
    pub fields: ToolCallUpdateFields,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallUpdateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolCallStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ToolCallContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ToolCallLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<serde_json::Value>,
}

impl ToolCallUpdate {
    pub fn new(tool_call_id: impl Into<ToolCallId>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            fields: ToolCallUpdateFields::default(),
        }
    }

    pub fn status(mut self, status: ToolCallStatus) -> Self {
        self.fields.status = Some(status);
        self
    }

    pub fn content(mut self, content: Vec<ToolCallContent>) -> Self {
        self.fields.content = Some(content);
        self
    }

    pub fn raw_output(mut self, raw_output: serde_json::Value) -> Self {
        self.fields.raw_output = Some(raw_output);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_builder_omits_unset_optionals() {
        let call = ToolCall::new("call-1", "Read file");
        let json = serde_json::to_value(&call).unwrap();
        assert!(json.get("kind").is_none());
        assert!(json.get("rawInput").is_none());
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn tool_call_update_merges_only_set_fields() {
        let update = ToolCallUpdate::new("call-1").status(ToolCallStatus::Completed);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "completed");
        assert!(json.get("content").is_none());
        assert!(json.get("title").is_none());
    }

    #[test]
    fn tool_call_content_tagged_union_round_trips() {
        let content = ToolCallContent::Content(Content::new(ContentBlock::text("done")));
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "content");
        let decoded: ToolCallContent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, content);
    }
}
