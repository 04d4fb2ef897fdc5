use std::env;

use agents_core::llm::{LanguageModel, LlmRequest, LlmResponse};
use agents_core::messaging::{AgentMessage, MessageContent, MessageRole, ToolCall};
use agents_core::tools::{ToolParameterSchema, ToolSchema};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

pub const ENV_AZURE_BASE_URL: &str = "AZURE_OPENAI_BASE_URL";
pub const ENV_AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_AZURE_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const ENV_AZURE_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: Option<String>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        self.api_url = api_url;
        self
    }
}

/// Azure OpenAI deployment settings.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource URL, or a full `.../openai/deployments/{name}` URL.
    pub base_url: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl AzureOpenAiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            deployment: DEFAULT_AZURE_DEPLOYMENT.to_string(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            read(name).ok_or_else(|| anyhow::anyhow!("Missing env var: {name}"))
        };
        let base_url = require(ENV_AZURE_BASE_URL)?;
        let api_key = require(ENV_AZURE_API_KEY)?;

        let mut config = Self::new(base_url, api_key);
        if let Some(deployment) = read(ENV_AZURE_DEPLOYMENT) {
            config.deployment = deployment;
        }
        if let Some(version) = read(ENV_AZURE_API_VERSION) {
            config.api_version = version;
        }
        Ok(config)
    }

    /// Chat-completions URL including the `api-version` query.
    pub fn chat_completions_url(&self) -> String {
        let deployment_url = if self.base_url.contains("/openai/deployments/") {
            self.base_url.clone()
        } else {
            format!("{}/openai/deployments/{}", self.base_url, self.deployment)
        };
        format!(
            "{deployment_url}/chat/completions?api-version={}",
            self.api_version
        )
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Clone)]
enum Auth {
    Bearer(String),
    ApiKey(String),
}

/// Chat-completions model with function calling, for OpenAI or Azure OpenAI.
pub struct OpenAiChatModel {
    client: Client,
    url: String,
    /// Sent in the body for OpenAI; Azure selects the model by deployment.
    model: Option<String>,
    auth: Auth,
}

impl OpenAiChatModel {
    pub fn new(config: OpenAiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: Self::http_client()?,
            url: config
                .api_url
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            model: Some(config.model),
            auth: Auth::Bearer(config.api_key),
        })
    }

    pub fn azure(config: AzureOpenAiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: Self::http_client()?,
            url: config.chat_completions_url(),
            model: None,
            auth: Auth::ApiKey(config.api_key),
        })
    }

    fn http_client() -> anyhow::Result<Client> {
        Ok(Client::builder()
            .user_agent(concat!("agents-runtime/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [OpenAiMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Serialize)]
struct OpenAiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction<'a>,
}

#[derive(Serialize)]
struct OpenAiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a ToolParameterSchema,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded arguments, as the API transmits them.
    arguments: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

fn to_openai_tools(tools: &[ToolSchema]) -> Vec<OpenAiTool<'_>> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            kind: "function",
            function: OpenAiFunction {
                name: &tool.name,
                description: &tool.description,
                parameters: &tool.parameters,
            },
        })
        .collect()
}

fn to_openai_messages(request: &LlmRequest) -> Vec<OpenAiMessage> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system_prompt.is_empty() {
        messages.push(OpenAiMessage::text("system", request.system_prompt.clone()));
    }

    // Tool results are only valid right after the assistant turn that requested them
    let mut last_was_tool_call = false;

    for msg in &request.messages {
        match (&msg.role, &msg.content) {
            (MessageRole::Agent, MessageContent::ToolCalls(calls)) => {
                messages.push(OpenAiMessage {
                    role: "assistant",
                    content: None,
                    tool_calls: Some(calls.iter().map(to_openai_call).collect()),
                    tool_call_id: None,
                });
                last_was_tool_call = true;
            }
            (MessageRole::Tool, content) => {
                if !last_was_tool_call {
                    tracing::warn!("Skipping tool message without preceding tool_calls");
                    continue;
                }
                messages.push(OpenAiMessage {
                    role: "tool",
                    content: Some(content.to_text()),
                    tool_calls: None,
                    tool_call_id: msg.tool_call_id().map(str::to_string),
                });
            }
            (role, content) => {
                let role = match role {
                    MessageRole::User => "user",
                    MessageRole::System => "system",
                    _ => "assistant",
                };
                messages.push(OpenAiMessage::text(role, content.to_text()));
                last_was_tool_call = false;
            }
        }
    }
    messages
}

fn to_openai_call(call: &ToolCall) -> OpenAiToolCall {
    OpenAiToolCall {
        id: call.id.clone(),
        kind: function_kind(),
        function: OpenAiFunctionCall {
            name: call.name.clone(),
            arguments: call.args.to_string(),
        },
    }
}

fn from_openai_call(call: OpenAiToolCall) -> ToolCall {
    let args = serde_json::from_str(&call.function.arguments).unwrap_or_else(|err| {
        tracing::warn!(
            tool = %call.function.name,
            error = %err,
            "tool arguments are not valid JSON"
        );
        Value::String(call.function.arguments.clone())
    });
    ToolCall {
        id: call.id,
        name: call.function.name,
        args,
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn generate(&self, request: LlmRequest) -> anyhow::Result<LlmResponse> {
        let messages = to_openai_messages(&request);
        let tools = to_openai_tools(&request.tools);
        let body = ChatRequest {
            model: self.model.as_deref(),
            messages: &messages,
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
        };

        tracing::debug!(
            model = self.model.as_deref().unwrap_or("azure-deployment"),
            messages = messages.len(),
            tools = request.tools.len(),
            "chat completion request"
        );

        let builder = self.client.post(&self.url).json(&body);
        let builder = match &self.auth {
            Auth::Bearer(key) => builder.bearer_auth(key),
            Auth::ApiKey(key) => builder.header("api-key", key),
        };
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %error_text, "chat completion failed");
            return Err(anyhow::anyhow!(
                "OpenAI API error: {} - {}",
                status,
                error_text
            ));
        }

        let data: ChatResponse = response.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("OpenAI response missing choices"))?;

        let message = if choice.message.tool_calls.is_empty() {
            AgentMessage::agent(choice.message.content.unwrap_or_default())
        } else {
            AgentMessage::tool_calls(
                choice
                    .message
                    .tool_calls
                    .into_iter()
                    .map(from_openai_call)
                    .collect(),
            )
        };

        Ok(LlmResponse { message })
    }
}
