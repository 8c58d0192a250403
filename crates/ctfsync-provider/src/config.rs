//! Provider configuration: where the CTFd instance lives and how to log in.

use std::sync::Arc;
use std::time::Duration;

use ctfsync_client::{Auth, CatalogApi, ClientError, CtfdClient, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::resource::ChallengeResource;
use crate::snapshot::{ChallengesDataSource, DEFAULT_CONCURRENCY};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the CTFd url is required")]
    MissingUrl,
    #[error("invalid CTFd url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("either an API key or a session must be configured")]
    MissingCredentials,
    #[error("configure an API key or a session, not both")]
    ConflictingCredentials,
    #[error("timeout must be at least one second")]
    InvalidTimeout,
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// CTFd instance root, e.g. `https://ctf.example.org`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Challenges hydrated in parallel during a catalog read.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            session: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("session", &redact(&self.session))
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

/// Empty strings count as unset; environment variables are often exported empty.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.url()?;
        self.auth()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    fn url(&self) -> Result<Url, ConfigError> {
        let raw = non_empty(&self.url).ok_or(ConfigError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn auth(&self) -> Result<Auth, ConfigError> {
        match (non_empty(&self.api_key), non_empty(&self.session)) {
            (Some(key), None) => Ok(Auth::Token(key.to_string())),
            (None, Some(session)) => Ok(Auth::Session(session.to_string())),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
            (None, None) => Err(ConfigError::MissingCredentials),
        }
    }

    /// Validate and build the shared client handed to data sources and resources.
    pub fn build_client(&self) -> Result<Arc<dyn CatalogApi>, ConfigError> {
        self.validate()?;
        let url = self.url()?;
        let client = CtfdClient::new(
            url.as_str().to_string(),
            self.auth()?,
            Duration::from_secs(self.timeout_secs),
        )?;
        info!(url = %client.base_url(), "configured CTFd client");
        Ok(Arc::new(client))
    }

    pub fn data_source(&self) -> Result<ChallengesDataSource, ConfigError> {
        Ok(ChallengesDataSource::new(self.build_client()?).with_concurrency(self.concurrency))
    }

    pub fn resource(&self) -> Result<ChallengeResource, ConfigError> {
        Ok(ChallengeResource::new(self.build_client()?))
    }
}
