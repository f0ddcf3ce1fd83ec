use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use url::Url;

/// Default completion API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default value of the `anthropic-version` header
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default model used when a caller does not pick one
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable overriding the API version tag
pub const API_VERSION_ENV: &str = "ANTHROPIC_VERSION";

/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";

/// Environment variable overriding the default model
pub const MODEL_ENV: &str = "AI_MODEL";

/// AI completion provider configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Provider API key; blank values are treated as absent
    #[serde(default, deserialize_with = "deserialize_api_key")]
    pub api_key: Option<SecretString>,
    /// Base URL the `/messages` path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Value sent in the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Default model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Default output token ceiling
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Timeout applied to each individual HTTP request
    #[serde(default = "default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
    /// Retry behaviour for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            api_version: default_api_version(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl AiConfig {
    /// Build a configuration from process environment variables
    ///
    /// A missing API key is not an error here: the client reports it as a
    /// configuration failure without touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if `ANTHROPIC_BASE_URL` is set but is not a valid URL
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            ..Self::default()
        };

        if let Ok(version) = std::env::var(API_VERSION_ENV)
            && !version.trim().is_empty()
        {
            config.api_version = version;
        }

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url =
                Url::parse(&base_url).map_err(|e| anyhow::anyhow!("invalid {BASE_URL_ENV} '{base_url}': {e}"))?;
        }

        if let Ok(model) = std::env::var(MODEL_ENV)
            && !model.trim().is_empty()
        {
            config.model = model;
        }

        Ok(config)
    }

    /// Whether an API key is available
    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Retry configuration for transient upstream failures
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    #[serde(default = "default_initial_delay", deserialize_with = "crate::duration::deserialize")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    #[serde(default = "default_max_delay", deserialize_with = "crate::duration::deserialize")]
    pub max_delay: Duration,
    /// Factor applied to the delay after each failed attempt
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Randomisation applied to each computed delay
    #[serde(default)]
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
            jitter: Jitter::default(),
        }
    }
}

/// Randomisation strategy for backoff delays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jitter {
    /// Deterministic delays
    #[default]
    None,
    /// Uniformly random delay between zero and the computed delay
    Full,
    /// Half the computed delay plus a random share of the other half
    Equal,
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|key| !key.trim().is_empty()).map(SecretString::from))
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

const fn default_max_tokens() -> u32 {
    1024
}

const fn default_temperature() -> f64 {
    0.3
}

const fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay() -> Duration {
    Duration::from_millis(1000)
}

const fn default_max_delay() -> Duration {
    Duration::from_millis(10_000)
}

const fn default_multiplier() -> f64 {
    2.0
}
