// src/sources/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::FeedbackSource;
use crate::config::sources::GitHubSourceConfig;
use crate::feedback::FeedbackItem;

pub const SOURCE_LABEL: &str = "GitHub";

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
}

/// Open issues of one repository.
pub struct GitHubIssues {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        token: Option<String>,
        client: reqwest::Client,
    },
}

impl GitHubIssues {
    /// Parse a captured `/repos/{repo}/issues` JSON body instead of calling the API.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &GitHubSourceConfig) -> Self {
        Self::new(&cfg.api_base, &cfg.repo, cfg.token.clone())
    }

    pub fn new(api_base: &str, repo: &str, token: Option<String>) -> Self {
        let url = format!("{}/repos/{}/issues", api_base.trim_end_matches('/'), repo);
        Self {
            mode: Mode::Http {
                url,
                token,
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<FeedbackItem>> {
        let issues: Vec<Issue> = serde_json::from_str(s).context("parsing github issues json")?;
        Ok(issues
            .into_iter()
            .map(|it| {
                let content = format!("{}\n{}", it.title, it.body.unwrap_or_default());
                FeedbackItem::text(SOURCE_LABEL, &content, &it.html_url)
            })
            .collect())
    }
}

#[async_trait]
impl FeedbackSource for GitHubIssues {
    async fn fetch(&self) -> Result<Vec<FeedbackItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, token, client } => {
                let mut req = client
                    .get(url)
                    .header(reqwest::header::USER_AGENT, "dev-feedback-insights")
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json");
                if let Some(t) = token {
                    req = req.header(reqwest::header::AUTHORIZATION, format!("token {t}"));
                }
                let body = req
                    .send()
                    .await
                    .context("github http get()")?
                    .error_for_status()
                    .context("github non-2xx")?
                    .text()
                    .await
                    .context("github http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_LABEL
    }
}
