//! Session identity and session-scoped configuration (spec.md §3 "Session").

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Unstable: agents may not implement model selection. Kept out of the
/// stable capability gate per spec.md §4.6 "unstable methods".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModel {
    pub id: String,
    pub name: String,
}

/// An MCP server an agent should connect to for a session (spec.md §3 "MCP
/// server config"). All agents must support `stdio`; `http`/`sse` are only
/// usable when the agent's `mcp_capabilities` advertises them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpServerConfig {
    Stdio {
        name: String,
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: std::collections::BTreeMap<String, String>,
    },
    Http {
        name: String,
        url: String,
        #[serde(default)]
        headers: std::collections::BTreeMap<String, String>,
    },
    Sse {
        name: String,
        url: String,
        #[serde(default)]
        headers: std::collections::BTreeMap<String, String>,
    },
}

/// Ambient extension, not present in the core spec: lets an agent surface a
/// freeform session setting the client can present as a picker, independent
/// of the fixed mode/model gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionConfigOptionCategory {
    Mode,
    Model,
    Tool,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigSelectOption {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigOption {
    pub id: String,
    pub name: String,
    pub category: SessionConfigOptionCategory,
    pub options: Vec<SessionConfigSelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_displays_as_inner_string() {
        let id = SessionId::new("sess-1");
        assert_eq!(id.to_string(), "sess-1");
    }

    #[test]
    fn mcp_server_config_stdio_defaults_args_and_env() {
        let value = serde_json::json!({"type": "stdio", "name": "fs", "command": "fs-server"});
        let config: McpServerConfig = serde_json::from_value(value).unwrap();
        match config {
            McpServerConfig::Stdio { args, env, .. } => {
                assert!(args.is_empty());
                assert!(env.is_empty());
            }
            other => panic!("expected Stdio, got {other:?}"),
        }
    }

    #[test]
    fn mcp_server_config_http_round_trips() {
        let config = McpServerConfig::Http {
            name: "docs".to_string(),
            url: "https://example.com/mcp".to_string(),
            headers: std::collections::BTreeMap::new(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "http");
        let decoded: McpServerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, config);
    }
}
