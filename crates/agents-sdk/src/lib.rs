//! # Grounded Agents SDK
//!
//! Function-calling chat agents whose web knowledge comes from Bing-grounded
//! runs on an Azure AI Foundry project.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agents_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = FoundryConfig::from_env()?;
//!     let tokens = Arc::new(CachedTokenProvider::new(AzureCliTokenProvider::default()));
//!     let search = Arc::new(GroundedSearch::from_config(&config, tokens)?);
//!
//!     let model = Arc::new(OpenAiChatModel::azure(AzureOpenAiConfig::from_env()?)?);
//!     let agent = ChatAgentBuilder::new("You are a helpful assistant.")
//!         .with_model(model)
//!         .with_tool(Arc::new(BingSearchTool::new(search)))
//!         .build()?;
//!
//!     let reply = agent.handle_message("What happened at Tesla yesterday?").await?;
//!     println!("{}", reply.content.to_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `foundry` (default): hosted agent client, grounded search and the `bing_search` tool

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core functionality (always available)
pub use agents_core::{llm, messaging, tools};
pub use agents_runtime::{
    AzureOpenAiConfig, ChatAgent, ChatAgentBuilder, OpenAiChatModel, OpenAiConfig,
};

// Re-export the hosted agent client (when foundry feature is enabled)
#[cfg(feature = "foundry")]
#[cfg_attr(docsrs, doc(cfg(feature = "foundry")))]
pub use agents_foundry as foundry;

/// Prelude module for common imports
///
/// ```rust
/// use agents_sdk::prelude::*;
/// ```
pub mod prelude {

    // Core types
    pub use agents_core::llm::LanguageModel;
    pub use agents_core::messaging::{AgentMessage, MessageContent, MessageRole, ToolCall};
    pub use agents_core::tools::{Tool, ToolContext, ToolResult, ToolSchema};

    // Runtime essentials
    pub use agents_runtime::{AzureOpenAiConfig, ChatAgentBuilder, OpenAiChatModel, OpenAiConfig};

    // Hosted grounding (when available)
    #[cfg(feature = "foundry")]
    pub use agents_foundry::{
        AzureCliTokenProvider, BingSearchTool, CachedTokenProvider, FoundryConfig,
        GroundedSearch, StaticTokenProvider,
    };
}
