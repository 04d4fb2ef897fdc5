//! Core tool system for function-calling agents
//!
//! Tools describe themselves with a JSON Schema so providers can advertise them
//! to the model, and the registry resolves the model's calls back to handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::messaging::AgentMessage;

/// JSON Schema definition for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolParameterSchema {
    /// JSON Schema type (object, string, number, boolean, array, null)
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, ToolParameterSchema>>,

    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolParameterSchema {
    fn scalar(schema_type: &str, description: impl Into<String>) -> Self {
        Self {
            schema_type: schema_type.to_string(),
            description: Some(description.into()),
            properties: None,
            required: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::scalar("string", description)
    }

    /// Create an object parameter with properties
    pub fn object(
        description: impl Into<String>,
        properties: HashMap<String, ToolParameterSchema>,
        required: Vec<String>,
    ) -> Self {
        Self {
            schema_type: "object".to_string(),
            description: Some(description.into()),
            properties: Some(properties),
            required: Some(required),
        }
    }
}

/// Complete schema definition for a tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Unique, stable name for this tool (used by the model for invocation)
    pub name: String,

    pub description: String,

    /// Input parameter schema (an object with properties)
    pub parameters: ToolParameterSchema,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Per-invocation context handed to tools.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Call ID assigned by the model, echoed back on the tool result.
    pub tool_call_id: Option<String>,
}

impl ToolContext {
    pub fn with_call_id(call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
        }
    }

    pub fn text_response(&self, content: impl Into<String>) -> AgentMessage {
        AgentMessage::tool_result(self.tool_call_id.clone().unwrap_or_default(), content)
    }
}

/// Result of a tool invocation
#[derive(Debug, Clone)]
pub enum ToolResult {
    Message(AgentMessage),
}

impl ToolResult {
    pub fn text(ctx: &ToolContext, content: impl Into<String>) -> Self {
        Self::Message(ctx.text_response(content))
    }

    pub fn into_message(self) -> AgentMessage {
        match self {
            ToolResult::Message(message) => message,
        }
    }
}

/// Core trait for tool implementations
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    async fn execute(&self, args: Value, ctx: ToolContext) -> anyhow::Result<ToolResult>;
}

pub type ToolBox = Arc<dyn Tool>;

/// Tool registry for resolving model tool calls to handlers
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolBox>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: ToolBox) -> &mut Self {
        let name = tool.schema().name;
        self.tools.insert(name, tool);
        self
    }

    pub fn register_all<I>(&mut self, tools: I) -> &mut Self
    where
        I: IntoIterator<Item = ToolBox>,
    {
        for tool in tools {
            self.register(tool);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolBox> {
        self.tools.get(name)
    }

    /// Schemas sorted by name so requests are deterministic.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
