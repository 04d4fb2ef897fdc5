use std::collections::HashMap;
use std::sync::Arc;

use agents_core::tools::{Tool, ToolContext, ToolParameterSchema, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::search::GroundedSearch;

pub const BING_SEARCH_TOOL_NAME: &str = "bing_search";
pub const BING_SEARCH_DESCRIPTION: &str =
    "Performs a web search using Bing, returning relevant results for grounding LLM responses.";

/// Exposes [`GroundedSearch`] to a function-calling model.
pub struct BingSearchTool {
    search: Arc<GroundedSearch>,
}

impl BingSearchTool {
    pub fn new(search: Arc<GroundedSearch>) -> Self {
        Self { search }
    }
}

#[derive(Debug, Deserialize)]
struct BingSearchArgs {
    query: String,
}

#[async_trait]
impl Tool for BingSearchTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            ToolParameterSchema::string("Search query"),
        );

        ToolSchema::new(
            BING_SEARCH_TOOL_NAME,
            BING_SEARCH_DESCRIPTION,
            ToolParameterSchema::object(
                "Bing search parameters",
                properties,
                vec!["query".to_string()],
            ),
        )
    }

    async fn execute(&self, args: Value, ctx: ToolContext) -> anyhow::Result<ToolResult> {
        let args: BingSearchArgs = serde_json::from_value(args)?;
        if args.query.trim().is_empty() {
            return Ok(ToolResult::text(&ctx, "Error: query must not be empty"));
        }

        info!(query = %args.query, "Start grounding with Bing search");
        let outcome = self.search.search(&args.query).await?;
        info!(answer_len = outcome.answer.len(), "Bing search finished");

        Ok(ToolResult::text(&ctx, outcome.answer))
    }
}
