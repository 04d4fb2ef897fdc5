//! Bearer token providers
//!
//! Every request asks the provider for a token instead of baking one into the
//! client at construction time. [`CachedTokenProvider`] keeps a token until it
//! is close to expiry, so long-lived clients keep working.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{FoundryError, FoundryResult};

/// Scope used for the agent service.
pub const AGENTS_SCOPE: &str = "https://ai.azure.com/.default";

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` means the token never expires from our point of view.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// True when the token expires within `skew` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => {
                let skew = chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::zero());
                expires_at - skew <= now
            }
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies bearer tokens for a fixed scope.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> FoundryResult<AccessToken>;
}

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    async fn get_token(&self) -> FoundryResult<AccessToken> {
        (**self).get_token().await
    }
}

/// A fixed token, e.g. from an environment variable.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, None),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> FoundryResult<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Obtains tokens from the signed-in Azure CLI (`az account get-access-token`).
#[derive(Debug, Clone)]
pub struct AzureCliTokenProvider {
    program: String,
    scope: String,
}

impl AzureCliTokenProvider {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            program: "az".to_string(),
            scope: scope.into(),
        }
    }

    /// Override the executable, mainly for environments where `az` is not on PATH.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for AzureCliTokenProvider {
    fn default() -> Self {
        Self::new(AGENTS_SCOPE)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

fn parse_cli_token(stdout: &[u8]) -> FoundryResult<AccessToken> {
    let parsed: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| FoundryError::auth(format!("unexpected az output: {e}")))?;
    let expires_at = parsed
        .expires_on
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    Ok(AccessToken::new(parsed.access_token, expires_at))
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn get_token(&self) -> FoundryResult<AccessToken> {
        debug!(scope = %self.scope, "requesting token from Azure CLI");
        let output = Command::new(&self.program)
            .args(["account", "get-access-token", "--scope", &self.scope, "--output", "json"])
            .output()
            .await
            .map_err(|e| FoundryError::auth(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FoundryError::auth(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_cli_token(&output.stdout)
    }
}

/// Caches the inner provider's token and refreshes it shortly before expiry.
pub struct CachedTokenProvider<P> {
    inner: P,
    refresh_skew: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl<P: TokenProvider> CachedTokenProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            refresh_skew: Duration::from_secs(300),
            cached: Mutex::new(None),
        }
    }

    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachedTokenProvider<P> {
    async fn get_token(&self) -> FoundryResult<AccessToken> {
        // Held across the refresh so concurrent callers wait for one fetch.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.expires_within(Utc::now(), self.refresh_skew) {
                return Ok(token.clone());
            }
            debug!(expires_at = ?token.expires_at, "cached token near expiry, refreshing");
        }

        let fresh = self.inner.get_token().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}
