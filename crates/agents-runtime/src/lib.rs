//! Tokio-powered runtime for function-calling chat agents.
//! Provides the OpenAI / Azure OpenAI chat-completions model and the
//! [`ChatAgent`] loop that lets the model decide when to call tools.

pub mod agent;
pub mod providers;

pub use agent::{ChatAgent, ChatAgentBuilder, DEFAULT_MAX_ITERATIONS};
pub use providers::{AzureOpenAiConfig, OpenAiChatModel, OpenAiConfig};
