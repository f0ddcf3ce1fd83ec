use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if request defaults or the retry policy are out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_request_defaults()?;
        self.validate_retry()?;
        Ok(())
    }

    fn validate_request_defaults(&self) -> anyhow::Result<()> {
        if self.ai.model.trim().is_empty() {
            anyhow::bail!("ai.model must not be empty");
        }

        if self.ai.max_tokens == 0 {
            anyhow::bail!("ai.max_tokens must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.ai.temperature) {
            anyhow::bail!("ai.temperature must be between 0.0 and 1.0");
        }

        if self.ai.timeout.is_zero() {
            anyhow::bail!("ai.timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        let retry = &self.ai.retry;

        if retry.max_attempts == 0 {
            anyhow::bail!("ai.retry.max_attempts must be at least 1");
        }

        if !retry.multiplier.is_finite() || retry.multiplier < 1.0 {
            anyhow::bail!("ai.retry.multiplier must be a finite number >= 1.0");
        }

        if retry.initial_delay > retry.max_delay {
            anyhow::bail!("ai.retry.initial_delay must not exceed ai.retry.max_delay");
        }

        Ok(())
    }
}
