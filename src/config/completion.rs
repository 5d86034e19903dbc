// src/config/completion.rs
use std::time::Duration;
use std::{env, fs, path::Path};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::completion::retry::{
    RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
};
use crate::feedback::DEFAULT_BATCH_SIZE;

pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_COMPLETION_CONFIG_PATH: &str = "config/completion.json";

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_MAX_TOKENS: &str = "COMPLETION_MAX_TOKENS";
pub const ENV_MAX_ATTEMPTS: &str = "COMPLETION_MAX_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "COMPLETION_RETRY_DELAY_MS";
pub const ENV_ATTEMPT_TIMEOUT_MS: &str = "COMPLETION_ATTEMPT_TIMEOUT_MS";
pub const ENV_BATCH_SIZE: &str = "FEEDBACK_BATCH_SIZE";

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}
fn default_attempt_timeout_ms() -> u64 {
    DEFAULT_ATTEMPT_TIMEOUT_MS
}

/// Completion endpoint + pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionConfig {
    /// e.g. https://YOUR-RESOURCE-NAME.openai.azure.com/ ; "ENV" reads AZURE_OPENAI_ENDPOINT
    #[serde(default)]
    pub endpoint: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: default_api_version(),
            max_tokens: DEFAULT_MAX_TOKENS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_nonempty(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
    }
}

impl CompletionConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// JSON file, then `"ENV"` indirection, then env overrides for tuning knobs.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading completion config from {}", path.display()))?;
        let mut cfg: CompletionConfig =
            serde_json::from_str(&data).context("parsing completion config json")?;

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var(ENV_API_KEY)
                .map_err(|_| anyhow::anyhow!("Missing {ENV_API_KEY} env var"))?;
        }
        if cfg.endpoint.trim().eq_ignore_ascii_case("env") {
            cfg.endpoint = env::var(ENV_ENDPOINT)
                .map_err(|_| anyhow::anyhow!("Missing {ENV_ENDPOINT} env var"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// `config/completion.json` overlaid with env if present, else environment only.
    pub fn load_default() -> anyhow::Result<Self> {
        let p = Path::new(DEFAULT_COMPLETION_CONFIG_PATH);
        if p.exists() {
            let mut cfg = Self::load_from_file(p)?;
            cfg.apply_env()?;
            cfg.validate()?;
            return Ok(cfg);
        }
        Self::from_env()
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Some(v) = env_nonempty(ENV_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = env_nonempty(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Some(v) = env_nonempty(ENV_DEPLOYMENT) {
            self.deployment = v;
        }
        if let Some(v) = env_nonempty(ENV_API_VERSION) {
            self.api_version = v;
        }
        if let Some(v) = env_parse(ENV_MAX_TOKENS)? {
            self.max_tokens = v;
        }
        if let Some(v) = env_parse(ENV_BATCH_SIZE)? {
            self.batch_size = v;
        }
        if let Some(v) = env_parse(ENV_MAX_ATTEMPTS)? {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse(ENV_RETRY_DELAY_MS)? {
            self.retry_delay_ms = v;
        }
        if let Some(v) = env_parse(ENV_ATTEMPT_TIMEOUT_MS)? {
            self.attempt_timeout_ms = v;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        if self.max_tokens == 0 {
            bail!("max_tokens must be at least 1");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
        }
    }

    /// Safe for logs: never includes the key itself.
    pub fn describe(&self) -> String {
        format!(
            "endpoint={}, deployment={}, api_version={}, key_len={}, batch_size={}, max_attempts={}",
            if self.endpoint.is_empty() { "<unset>" } else { self.endpoint.as_str() },
            self.deployment,
            self.api_version,
            self.api_key.len(),
            self.batch_size,
            self.max_attempts
        )
    }
}
