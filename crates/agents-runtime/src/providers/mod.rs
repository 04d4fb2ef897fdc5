pub mod openai;

pub use openai::{AzureOpenAiConfig, OpenAiChatModel, OpenAiConfig};
