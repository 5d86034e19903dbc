// src/completion/azure.rs
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};
use crate::config::CompletionConfig;

/// Azure OpenAI legacy completions endpoint:
/// `POST {endpoint}/openai/deployments/{deployment}/completions?api-version=...`
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureOpenAiClient {
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dev-feedback-insights/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/completions",
            self.endpoint, deployment
        )
    }
}

#[derive(Serialize)]
struct Req<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrBody {
    error: ErrDetail,
}

#[derive(Deserialize)]
struct ErrDetail {
    message: String,
}

/// Prefer the service's `error.message`; otherwise the raw body or the status reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrBody>(body) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(300).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if self.endpoint.is_empty() || self.api_key.is_empty() {
            return Err(CompletionError::MissingCredentials);
        }

        let body = Req {
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .http
            .post(self.url(&request.deployment))
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let parsed: Resp = resp
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| CompletionError::Decode("response had no choices".into()))?;

        Ok(CompletionResponse {
            text: text.trim().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "azure-openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_service_message() {
        let body = r#"{"error":{"code":"429","message":"Requests have exceeded the call rate limit."}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body),
            "Requests have exceeded the call rate limit."
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_REQUEST, " plain "),
            "plain"
        );
    }

    #[test]
    fn url_joins_without_double_slash() {
        let cfg = CompletionConfig {
            endpoint: "https://res.openai.azure.com/".into(),
            api_key: "k".into(),
            ..CompletionConfig::default()
        };
        let client = AzureOpenAiClient::new(&cfg).unwrap();
        assert_eq!(
            client.url("gpt35"),
            "https://res.openai.azure.com/openai/deployments/gpt35/completions"
        );
    }
}
