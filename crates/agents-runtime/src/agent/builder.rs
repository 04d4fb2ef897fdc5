//! Fluent builder for [`ChatAgent`].

use std::sync::Arc;

use agents_core::llm::LanguageModel;
use agents_core::messaging::AgentMessage;
use agents_core::tools::{ToolBox, ToolRegistry};

use super::runtime::ChatAgent;

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

pub struct ChatAgentBuilder {
    instructions: String,
    model: Option<Arc<dyn LanguageModel>>,
    tools: Vec<ToolBox>,
    history: Vec<AgentMessage>,
    max_iterations: usize,
}

impl ChatAgentBuilder {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            model: None,
            tools: Vec::new(),
            history: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_tool(mut self, tool: ToolBox) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools<I>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = ToolBox>,
    {
        self.tools.extend(tools);
        self
    }

    /// Start from an existing conversation.
    pub fn with_history(mut self, history: Vec<AgentMessage>) -> Self {
        self.history = history;
        self
    }

    /// Model round-trips allowed per user turn (at least one).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn build(self) -> anyhow::Result<ChatAgent> {
        let model = self
            .model
            .ok_or_else(|| anyhow::anyhow!("model must be set (use with_model)"))?;
        let mut tools = ToolRegistry::new();
        tools.register_all(self.tools);

        Ok(ChatAgent::from_parts(
            self.instructions,
            model,
            tools,
            self.history,
            self.max_iterations,
        ))
    }
}
