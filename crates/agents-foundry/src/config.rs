//! Client configuration, loaded from the environment or built in code.

use std::env;
use std::time::Duration;

use crate::error::{FoundryError, FoundryResult};
use crate::poller::PollPolicy;

pub const DEFAULT_API_VERSION: &str = "2025-05-15-preview";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENV_ENDPOINT: &str = "AZURE_AI_FOUNDRY_PROJECT_ENDPOINT";
pub const ENV_API_VERSION: &str = "AZURE_AI_FOUNDRY_API_VERSION";
pub const ENV_CONNECTION_ID: &str = "BING_SEARCH_CONNECTION_ID";
pub const ENV_POLL_INTERVAL_MS: &str = "FOUNDRY_POLL_INTERVAL_MS";
pub const ENV_POLL_DEADLINE_SECS: &str = "FOUNDRY_POLL_DEADLINE_SECS";

/// Settings for one hosted agent project.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundryConfig {
    /// Project endpoint, without a trailing slash.
    pub endpoint: String,
    pub api_version: String,
    /// Bing grounding connection attached to created agents.
    pub connection_id: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub poll: PollPolicy,
}

impl FoundryConfig {
    pub fn new(endpoint: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connection_id: connection_id.into(),
            timeout: DEFAULT_TIMEOUT,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Load from process environment variables.
    pub fn from_env() -> FoundryResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> FoundryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            read(name).ok_or_else(|| FoundryError::config(format!("Missing env var: {name}")))
        };

        let mut config = Self::new(require(ENV_ENDPOINT)?, require(ENV_CONNECTION_ID)?);
        if let Some(version) = read(ENV_API_VERSION) {
            config.api_version = version;
        }
        if let Some(ms) = read(ENV_POLL_INTERVAL_MS) {
            config.poll.interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &ms)?);
        }
        if let Some(secs) = read(ENV_POLL_DEADLINE_SECS) {
            config.poll.deadline =
                Some(Duration::from_secs(parse_number(ENV_POLL_DEADLINE_SECS, &secs)?));
        }
        Ok(config)
    }
}

fn parse_number(name: &str, raw: &str) -> FoundryResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| {
            FoundryError::config(format!(
                "{name} must be a non-negative integer, got {raw:?}"
            ))
        })
}
