// src/sources/stackoverflow.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::FeedbackSource;
use crate::config::sources::StackOverflowSourceConfig;
use crate::feedback::FeedbackItem;

pub const SOURCE_LABEL: &str = "Stack Overflow";

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    link: String,
}

/// Recently active questions carrying all configured tags.
/// The Stack Exchange API always gzips its responses (reqwest `gzip` feature).
pub struct StackOverflowQuestions {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        tagged: String,
        client: reqwest::Client,
    },
}

impl StackOverflowQuestions {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &StackOverflowSourceConfig) -> Self {
        Self::new(&cfg.api_base, &cfg.tags)
    }

    pub fn new(api_base: &str, tags: &[String]) -> Self {
        Self {
            mode: Mode::Http {
                url: format!("{}/2.3/questions", api_base.trim_end_matches('/')),
                tagged: tags.join(";"),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<FeedbackItem>> {
        let page: Page = serde_json::from_str(s).context("parsing stack exchange json")?;
        Ok(page
            .items
            .into_iter()
            .map(|q| {
                let title = html_escape::decode_html_entities(&q.title);
                FeedbackItem::text(SOURCE_LABEL, &title, &q.link)
            })
            .collect())
    }
}

#[async_trait]
impl FeedbackSource for StackOverflowQuestions {
    async fn fetch(&self) -> Result<Vec<FeedbackItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                url,
                tagged,
                client,
            } => {
                let body = client
                    .get(url)
                    .query(&[
                        ("order", "desc"),
                        ("sort", "activity"),
                        ("tagged", tagged.as_str()),
                        ("site", "stackoverflow"),
                    ])
                    .send()
                    .await
                    .context("stackoverflow http get()")?
                    .error_for_status()
                    .context("stackoverflow non-2xx")?
                    .text()
                    .await
                    .context("stackoverflow http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_LABEL
    }
}
