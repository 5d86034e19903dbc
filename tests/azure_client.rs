// tests/azure_client.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::lettered_items;
use dev_feedback_insights::completion::retry::RATE_LIMIT_MESSAGE;
use dev_feedback_insights::completion::{
    AzureOpenAiClient, CompletionClient, CompletionError, CompletionRequest,
};
use dev_feedback_insights::feedback::{PipelineSettings, Summarizer};
use dev_feedback_insights::CompletionConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEPLOYMENT: &str = "gpt-35-instruct";

fn config_for(server: &MockServer) -> CompletionConfig {
    CompletionConfig {
        endpoint: format!("{}/", server.uri()),
        api_key: "test-key".into(),
        deployment: DEPLOYMENT.into(),
        retry_delay_ms: 20,
        ..CompletionConfig::default()
    }
}

fn request(prompt: &str) -> CompletionRequest {
    CompletionRequest {
        prompt: prompt.into(),
        max_tokens: 4096,
        deployment: DEPLOYMENT.into(),
    }
}

fn completions_path() -> String {
    format!("/openai/deployments/{DEPLOYMENT}/completions")
}

#[tokio::test]
async fn success_returns_trimmed_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(completions_path()))
        .and(query_param("api-version", "2024-12-01-preview"))
        .and(header("api-key", "test-key"))
        .and(body_partial_json(json!({ "prompt": "hello", "max_tokens": 4096 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "\n Pain Points 1:\n- slow \n", "index": 0 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AzureOpenAiClient::new(&config_for(&server)).unwrap();
    let resp = client.complete(&request("hello")).await.unwrap();
    assert_eq!(resp.text, "Pain Points 1:\n- slow");
}

#[tokio::test]
async fn status_429_is_classified_as_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(completions_path()))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": "429", "message": "Requests have exceeded the call rate limit." }
        })))
        .mount(&server)
        .await;

    let client = AzureOpenAiClient::new(&config_for(&server)).unwrap();
    let err = client.complete(&request("p")).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(
        err,
        CompletionError::Api {
            status: 429,
            message: "Requests have exceeded the call rate limit.".into()
        }
    );
}

#[tokio::test]
async fn missing_credentials_never_hit_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config_for(&server);
    cfg.api_key.clear();
    let client = AzureOpenAiClient::new(&cfg).unwrap();
    assert_eq!(
        client.complete(&request("p")).await.unwrap_err(),
        CompletionError::MissingCredentials
    );
}

#[tokio::test]
async fn empty_choices_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = AzureOpenAiClient::new(&config_for(&server)).unwrap();
    assert!(matches!(
        client.complete(&request("p")).await.unwrap_err(),
        CompletionError::Decode(_)
    ));
}

#[tokio::test]
async fn pipeline_retries_429_against_live_http_then_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(completions_path()))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let cfg = config_for(&server);
    let client = Arc::new(AzureOpenAiClient::new(&cfg).unwrap());
    let s = Summarizer::new(client, PipelineSettings::from(&cfg));

    let out = s.summarize(&lettered_items(2), None).await.unwrap();
    assert!(out.iter().all(|r| r.summary == RATE_LIMIT_MESSAGE));
    assert_eq!(s.settings().retry.delay, Duration::from_millis(20));
}

#[tokio::test]
async fn pipeline_surfaces_server_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(completions_path()))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "The server had an error while processing your request." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = config_for(&server);
    let s = Summarizer::new(
        Arc::new(AzureOpenAiClient::new(&cfg).unwrap()),
        PipelineSettings::from(&cfg),
    );

    let out = s.summarize(&lettered_items(3), None).await.unwrap();
    assert!(out.iter().all(|r| r.summary
        == "Error: 500 The server had an error while processing your request."));
}
