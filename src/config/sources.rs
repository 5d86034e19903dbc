// src/config/sources.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";

fn yes() -> bool {
    true
}
fn default_repo() -> String {
    "microsoft/teams-ai".to_string()
}
fn default_github_api() -> String {
    "https://api.github.com".to_string()
}
fn default_tags() -> Vec<String> {
    vec!["microsoft-teams".to_string(), "botframework".to_string()]
}
fn default_stackexchange_api() -> String {
    "https://api.stackexchange.com".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GitHubSourceConfig {
    #[serde(default = "yes")]
    pub enabled: bool,
    /// "owner/name"
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_github_api")]
    pub api_base: String,
    /// Filled from GITHUB_TOKEN, never from the file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GitHubSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo: default_repo(),
            api_base: default_github_api(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StackOverflowSourceConfig {
    #[serde(default = "yes")]
    pub enabled: bool,
    /// All tags must match (joined with `;` in the query).
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default = "default_stackexchange_api")]
    pub api_base: String,
}

impl Default for StackOverflowSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tags: default_tags(),
            api_base: default_stackexchange_api(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SourcesConfig {
    #[serde(default)]
    pub github: GitHubSourceConfig,
    #[serde(default)]
    pub stackoverflow: StackOverflowSourceConfig,
}

impl SourcesConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources config from {}", path.display()))?;
        let cfg: SourcesConfig = toml::from_str(&content).context("parsing sources toml")?;
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $SOURCES_CONFIG_PATH
    /// 2) config/sources.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (GITHUB_TOKEN, GITHUB_REPO, STACKOVERFLOW_TAGS) apply on top.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_SOURCES_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("SOURCES_CONFIG_PATH points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_SOURCES_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        self.github.token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        if let Ok(repo) = std::env::var("GITHUB_REPO") {
            if !repo.trim().is_empty() {
                self.github.repo = repo.trim().to_string();
            }
        }
        if let Ok(tags) = std::env::var("STACKOVERFLOW_TAGS") {
            let parsed = split_tags(&tags);
            if !parsed.is_empty() {
                self.stackoverflow.tags = parsed;
            }
        }
    }
}

/// Accepts `a;b` or `a, b`.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
