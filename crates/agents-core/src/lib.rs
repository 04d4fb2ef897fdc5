//! Core traits and shared data models for grounded agents.
//! This crate keeps the domain primitives lightweight and transport-agnostic
//! so the runtime and the hosted-agent client can compose them freely.

pub mod llm;
pub mod messaging;
pub mod tools;

pub use llm::{LanguageModel, LlmRequest, LlmResponse};
pub use messaging::{AgentMessage, MessageContent, MessageMetadata, MessageRole, ToolCall};
pub use tools::{
    Tool, ToolBox, ToolContext, ToolParameterSchema, ToolRegistry, ToolResult, ToolSchema,
};
