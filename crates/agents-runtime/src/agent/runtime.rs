//! Chat agent runtime
//!
//! Keeps the conversation history, advertises registered tools to the model
//! and executes the tool calls it requests until it answers in text.

use std::sync::{Arc, RwLock};

use agents_core::llm::{LanguageModel, LlmRequest};
use agents_core::messaging::{AgentMessage, MessageMetadata, ToolCall};
use agents_core::tools::{ToolContext, ToolRegistry};
use futures::future::join_all;

pub struct ChatAgent {
    instructions: String,
    model: Arc<dyn LanguageModel>,
    tools: ToolRegistry,
    history: Arc<RwLock<Vec<AgentMessage>>>,
    max_iterations: usize,
}

impl ChatAgent {
    pub(super) fn from_parts(
        instructions: String,
        model: Arc<dyn LanguageModel>,
        tools: ToolRegistry,
        history: Vec<AgentMessage>,
        max_iterations: usize,
    ) -> Self {
        Self {
            instructions,
            model,
            tools,
            history: Arc::new(RwLock::new(history)),
            max_iterations,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn history(&self) -> Vec<AgentMessage> {
        self.history.read().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn clear_history(&self) {
        if let Ok(mut history) = self.history.write() {
            history.clear();
        }
    }

    fn append_history(&self, message: AgentMessage) {
        if let Ok(mut history) = self.history.write() {
            history.push(message);
        }
    }

    /// Add a user turn and drive the model until it answers in text.
    pub async fn handle_message(&self, input: impl AsRef<str>) -> anyhow::Result<AgentMessage> {
        self.append_history(AgentMessage::user(input.as_ref()));

        for iteration in 1..=self.max_iterations {
            let request = LlmRequest::new(self.instructions.clone(), self.history())
                .with_tools(self.tools.schemas());
            let message = self.model.generate(request).await?.message;
            self.append_history(message.clone());

            let calls = match message.content.as_tool_calls() {
                Some(calls) if !calls.is_empty() => calls,
                _ => return Ok(message),
            };

            tracing::debug!(
                iteration,
                tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "model requested tools"
            );
            let results = join_all(calls.iter().map(|call| self.execute_tool_call(call))).await;
            for result in results {
                self.append_history(result);
            }
        }

        Err(anyhow::anyhow!(
            "tool loop exceeded {} iterations without a final answer",
            self.max_iterations
        ))
    }

    /// Run one tool call. Failures become tool-result text so the model can react.
    async fn execute_tool_call(&self, call: &ToolCall) -> AgentMessage {
        let ctx = ToolContext::with_call_id(call.id.clone());
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(tool = %call.name, "model requested unknown tool");
            return ctx.text_response(format!("Tool '{}' not available", call.name));
        };

        match tool.execute(call.args.clone(), ctx.clone()).await {
            Ok(result) => {
                let mut message = result.into_message();
                if message.tool_call_id().is_none() {
                    message.metadata = Some(MessageMetadata {
                        tool_call_id: Some(call.id.clone()),
                    });
                }
                message
            }
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "tool execution failed");
                ctx.text_response(format!("Error: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::ChatAgentBuilder;
    use super::*;
    use agents_core::llm::LlmResponse;
    use agents_core::messaging::{MessageContent, MessageRole};
    use agents_core::tools::{Tool, ToolParameterSchema, ToolResult, ToolSchema};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays canned replies and records every request it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<AgentMessage>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<AgentMessage>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, request: LlmRequest) -> anyhow::Result<LlmResponse> {
            self.requests.lock().unwrap().push(request);
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))?;
            Ok(LlmResponse { message })
        }
    }

    struct EchoSearch;

    #[async_trait]
    impl Tool for EchoSearch {
        fn schema(&self) -> ToolSchema {
            let mut properties = HashMap::new();
            properties.insert("query".to_string(), ToolParameterSchema::string("query"));
            ToolSchema::new(
                "bing_search",
                "search",
                ToolParameterSchema::object("params", properties, vec!["query".to_string()]),
            )
        }

        async fn execute(&self, args: Value, ctx: ToolContext) -> anyhow::Result<ToolResult> {
            let query = args
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow::anyhow!("missing query"))?;
            Ok(ToolResult::text(&ctx, format!("results for {query}")))
        }
    }

    fn call(id: &str, args: Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "bing_search".into(),
            args,
        }
    }

    fn agent(model: Arc<ScriptedModel>) -> ChatAgent {
        ChatAgentBuilder::new("You answer with fresh news.")
            .with_model(model)
            .with_tool(Arc::new(EchoSearch))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn plain_answer_needs_one_model_call() {
        let model = ScriptedModel::new(vec![AgentMessage::agent("hello")]);
        let agent = agent(model.clone());

        let reply = agent.handle_message("hi").await.unwrap();
        assert_eq!(reply.content.as_text(), Some("hello"));
        assert_eq!(agent.history().len(), 2);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_prompt, "You answer with fresh news.");
        assert_eq!(requests[0].tools[0].name, "bing_search");
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_before_the_answer() {
        let model = ScriptedModel::new(vec![
            AgentMessage::tool_calls(vec![call("call_1", json!({ "query": "tesla" }))]),
            AgentMessage::agent("Tesla shares rose."),
        ]);
        let agent = agent(model.clone());

        let reply = agent.handle_message("tesla news?").await.unwrap();
        assert_eq!(reply.content.as_text(), Some("Tesla shares rose."));

        let requests = model.requests();
        let tool_turn = requests[1].messages.last().unwrap();
        assert_eq!(tool_turn.role, MessageRole::Tool);
        assert_eq!(tool_turn.tool_call_id(), Some("call_1"));
        assert_eq!(tool_turn.content.as_text(), Some("results for tesla"));
    }

    #[tokio::test]
    async fn parallel_calls_keep_request_order() {
        let model = ScriptedModel::new(vec![
            AgentMessage::tool_calls(vec![
                call("call_a", json!({ "query": "a" })),
                call("call_b", json!({ "query": "b" })),
            ]),
            AgentMessage::agent("done"),
        ]);
        let agent = agent(model);
        agent.handle_message("two searches").await.unwrap();

        let ids: Vec<Option<String>> = agent
            .history()
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .map(|m| m.tool_call_id().map(str::to_string))
            .collect();
        assert_eq!(ids, vec![Some("call_a".into()), Some("call_b".into())]);
    }

    #[tokio::test]
    async fn tool_errors_are_reported_to_the_model() {
        let model = ScriptedModel::new(vec![
            AgentMessage::tool_calls(vec![call("call_1", json!({}))]),
            AgentMessage::agent("sorry"),
        ]);
        let agent = agent(model.clone());
        agent.handle_message("search nothing").await.unwrap();

        let tool_turn = model.requests()[1].messages.last().cloned().unwrap();
        assert_eq!(
            tool_turn.content,
            MessageContent::Text("Error: missing query".into())
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_answered_without_failing() {
        let model = ScriptedModel::new(vec![
            AgentMessage::tool_calls(vec![ToolCall {
                id: "call_1".into(),
                name: "weather".into(),
                args: json!({}),
            }]),
            AgentMessage::agent("no weather tool"),
        ]);
        let agent = agent(model.clone());
        agent.handle_message("weather?").await.unwrap();

        let tool_turn = model.requests()[1].messages.last().cloned().unwrap();
        assert_eq!(tool_turn.content.to_text(), "Tool 'weather' not available");
    }

    #[tokio::test]
    async fn runaway_tool_loop_is_bounded() {
        let replies = (0..3)
            .map(|i| {
                AgentMessage::tool_calls(vec![call(&format!("call_{i}"), json!({ "query": "x" }))])
            })
            .collect();
        let model = ScriptedModel::new(replies);
        let agent = ChatAgentBuilder::new("")
            .with_model(model.clone())
            .with_tool(Arc::new(EchoSearch))
            .with_max_iterations(3)
            .build()
            .unwrap();

        let err = agent.handle_message("loop").await.unwrap_err();
        assert!(err.to_string().contains("exceeded 3 iterations"));
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn history_carries_across_turns() {
        let model =
            ScriptedModel::new(vec![AgentMessage::agent("one"), AgentMessage::agent("two")]);
        let agent = agent(model.clone());
        agent.handle_message("first").await.unwrap();
        agent.handle_message("second").await.unwrap();

        assert_eq!(model.requests()[1].messages.len(), 3);
        agent.clear_history();
        assert!(agent.history().is_empty());
    }
}
