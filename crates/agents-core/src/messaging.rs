use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Core message structure exchanged between the chat loop, models, and tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    pub role: MessageRole,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl AgentMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::text(MessageRole::Agent, text)
    }

    /// Assistant turn that asks the runtime to execute one or more tools.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Agent,
            content: MessageContent::ToolCalls(calls),
            metadata: None,
        }
    }

    /// Tool output correlated with the call that produced it.
    pub fn tool_result(tool_call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: MessageContent::Text(text.into()),
            metadata: Some(MessageMetadata {
                tool_call_id: Some(tool_call_id.into()),
            }),
        }
    }

    fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
            metadata: None,
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.tool_call_id.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Agent,
    Tool,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum MessageContent {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_tool_calls(&self) -> Option<&[ToolCall]> {
        match self {
            MessageContent::ToolCalls(calls) => Some(calls.as_slice()),
            _ => None,
        }
    }

    /// Flatten the content into plain text for transports that only accept strings.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::ToolCalls(calls) => {
                serde_json::json!({ "tool_calls": calls }).to_string()
            }
        }
    }
}

/// A single function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}
