//! Programmatic configuration builder for integration tests

use std::time::Duration;

use ielts_config::{AiConfig, RetryConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: AiConfig,
}

impl ConfigBuilder {
    /// Point the client at a mock provider with fast retries
    pub fn new(base_url: &str) -> Self {
        Self {
            config: AiConfig {
                api_key: Some(SecretString::from("test-key")),
                base_url: base_url.parse().expect("valid URL"),
                model: "mock-model".to_owned(),
                timeout: Duration::from_secs(5),
                retry: RetryConfig {
                    initial_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(50),
                    ..RetryConfig::default()
                },
                ..AiConfig::default()
            },
        }
    }

    /// Remove the API key
    pub fn without_credential(mut self) -> Self {
        self.config.api_key = None;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    /// Per-request HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> AiConfig {
        self.config
    }
}
