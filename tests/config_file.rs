// tests/config_file.rs
// Mutates process env; serialized with serial_test.

use std::{env, fs};

use dev_feedback_insights::CompletionConfig;

#[serial_test::serial]
#[test]
fn env_indirection_resolves_key_and_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("completion.json");
    fs::write(
        &p,
        r#"{"endpoint":"ENV","api_key":"ENV","deployment":"gpt-35","batch_size":3}"#,
    )
    .unwrap();

    env::set_var("OPENAI_API_KEY", "k-123");
    env::set_var("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com/");
    let cfg = CompletionConfig::load_from_file(&p).unwrap();
    env::remove_var("OPENAI_API_KEY");
    env::remove_var("AZURE_OPENAI_ENDPOINT");

    assert_eq!(cfg.api_key, "k-123");
    assert_eq!(cfg.endpoint, "https://res.openai.azure.com/");
    assert_eq!(cfg.batch_size, 3);
    assert_eq!(cfg.max_attempts, 2);
}

#[serial_test::serial]
#[test]
fn env_indirection_without_env_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("completion.json");
    fs::write(&p, r#"{"api_key":"ENV"}"#).unwrap();
    env::remove_var("OPENAI_API_KEY");
    assert!(CompletionConfig::load_from_file(&p).is_err());
}

#[serial_test::serial]
#[test]
fn from_env_overrides_defaults_and_rejects_garbage() {
    env::set_var("FEEDBACK_BATCH_SIZE", "8");
    env::set_var("COMPLETION_RETRY_DELAY_MS", "250");
    let cfg = CompletionConfig::from_env().unwrap();
    assert_eq!(cfg.batch_size, 8);
    assert_eq!(cfg.retry_delay_ms, 250);

    env::set_var("FEEDBACK_BATCH_SIZE", "0");
    assert!(CompletionConfig::from_env().is_err());

    env::set_var("FEEDBACK_BATCH_SIZE", "five");
    assert!(CompletionConfig::from_env().is_err());

    env::remove_var("FEEDBACK_BATCH_SIZE");
    env::remove_var("COMPLETION_RETRY_DELAY_MS");
}

#[serial_test::serial]
#[test]
fn shipped_config_file_parses() {
    let cfg = CompletionConfig::load_from_file("config/completion.json").unwrap();
    assert_eq!(cfg.batch_size, 5);
    assert_eq!(cfg.retry_delay_ms, 3000);
}
