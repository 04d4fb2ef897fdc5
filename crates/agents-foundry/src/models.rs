//! Wire models for the hosted agent service (assistants, threads, messages, runs).

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{FoundryError, FoundryResult};

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful agent.";
pub const DEFAULT_AGENT_NAME: &str = "my-agent";
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o";
pub const DEFAULT_RESULT_COUNT: u32 = 7;
pub const DEFAULT_MARKET: &str = "en-US";
pub const DEFAULT_SET_LANG: &str = "en";
pub const DEFAULT_FRESHNESS_DAYS: i64 = 3;

/// One Bing grounding search configuration attached to the agent's tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfiguration {
    pub connection_id: String,
    pub count: u32,
    pub market: String,
    pub set_lang: String,
    /// Oldest publication date accepted, `YYYY-MM-DD`.
    pub freshness: String,
}

impl SearchConfiguration {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self::with_today(connection_id, Local::now().date_naive())
    }

    /// Defaults relative to an explicit "today", so freshness is reproducible.
    pub fn with_today(connection_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            connection_id: connection_id.into(),
            count: DEFAULT_RESULT_COUNT,
            market: DEFAULT_MARKET.to_string(),
            set_lang: DEFAULT_SET_LANG.to_string(),
            freshness: freshness_since(today, DEFAULT_FRESHNESS_DAYS),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    pub fn with_set_lang(mut self, set_lang: impl Into<String>) -> Self {
        self.set_lang = set_lang.into();
        self
    }

    pub fn with_freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = freshness.into();
        self
    }
}

/// Date `days` before `today`, formatted `YYYY-MM-DD`.
pub fn freshness_since(today: NaiveDate, days: i64) -> String {
    (today - ChronoDuration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BingGrounding {
    pub search_configurations: Vec<SearchConfiguration>,
}

/// Tool definition attached to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentTool {
    BingGrounding { bing_grounding: BingGrounding },
}

impl AgentTool {
    pub fn bing(config: SearchConfiguration) -> Self {
        AgentTool::BingGrounding {
            bing_grounding: BingGrounding {
                search_configurations: vec![config],
            },
        }
    }
}

/// Body of `POST /assistants`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateAgentRequest {
    pub instructions: String,
    pub name: String,
    pub model: String,
    pub tools: Vec<AgentTool>,
}

impl CreateAgentRequest {
    /// Default grounding agent for the given Bing connection.
    pub fn bing_grounded(config: SearchConfiguration) -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            name: DEFAULT_AGENT_NAME.to_string(),
            model: DEFAULT_AGENT_MODEL.to_string(),
            tools: vec![AgentTool::bing(config)],
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Every grounding configuration must name a connection.
    pub fn validate(&self) -> FoundryResult<()> {
        for tool in &self.tools {
            let AgentTool::BingGrounding { bing_grounding } = tool;
            if bing_grounding.search_configurations.is_empty() {
                return Err(FoundryError::config(
                    "bing_grounding tool has no search configuration",
                ));
            }
            if bing_grounding
                .search_configurations
                .iter()
                .any(|c| c.connection_id.trim().is_empty())
            {
                return Err(FoundryError::config(
                    "bing_grounding connection_id must not be empty",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThreadRole {
    User,
    Assistant,
}

/// Body of `POST /threads/{id}/messages`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateMessageRequest {
    pub content: String,
    pub role: ThreadRole,
}

impl CreateMessageRequest {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: ThreadRole::User,
        }
    }
}

/// URL citation attached to grounded text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UrlCitation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextAnnotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url_citation: Option<UrlCitation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContentPart {
    Text { text: MessageText },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: ThreadRole,
    #[serde(default)]
    pub content: Vec<MessageContentPart>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ThreadMessage {
    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContentPart::Text { text } => Some(text.value.as_str()),
                MessageContentPart::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn citations(&self) -> impl Iterator<Item = &UrlCitation> {
        self.content.iter().flat_map(|part| match part {
            MessageContentPart::Text { text } => text
                .annotations
                .iter()
                .filter_map(|a| a.url_citation.as_ref())
                .collect::<Vec<_>>(),
            MessageContentPart::Unsupported => Vec::new(),
        })
    }
}

/// Body of `POST /threads/{id}/runs`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

/// Status reported for a run. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Expired,
    Incomplete,
    Completed,
    Failed,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Other(other) => other.as_str(),
        }
    }

    /// Statuses after which the poller stops.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Incomplete
        )
    }
}

impl From<&str> for RunStatus {
    fn from(value: &str) -> Self {
        match value {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            "incomplete" => RunStatus::Incomplete,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            other => RunStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RunStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(RunStatus::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub incomplete_details: Option<Value>,
    #[serde(default)]
    pub last_error: Option<Value>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
}

impl<T> ListPage<T> {
    pub fn new(data: Vec<T>, has_more: bool) -> Self {
        Self {
            data,
            has_more,
            first_id: None,
            last_id: None,
        }
    }
}

/// Item of a listing: only the id matters for cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRef {
    pub id: String,
}
