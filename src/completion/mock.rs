// src/completion/mock.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};

/// One scripted reply; `delay` simulates endpoint latency.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub delay: Duration,
    pub result: Result<String, CompletionError>,
}

/// Deterministic completion client for tests and `AI_TEST_MODE=mock`.
///
/// Scripted replies are consumed in call order. Once the script is empty the
/// mock answers with one `Pain Points {i}:` section per marker found at the
/// end of the prompt.
#[derive(Debug, Default)]
pub struct MockCompletion {
    script: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn echo_markers() -> Self {
        Self::default()
    }

    pub fn then_ok(self, text: &str) -> Self {
        self.push(Duration::ZERO, Ok(text.to_string()))
    }

    pub fn then_ok_after(self, delay: Duration, text: &str) -> Self {
        self.push(delay, Ok(text.to_string()))
    }

    pub fn then_err(self, err: CompletionError) -> Self {
        self.push(Duration::ZERO, Err(err))
    }

    pub fn then_status(self, status: u16, message: &str) -> Self {
        self.then_err(CompletionError::Api {
            status,
            message: message.to_string(),
        })
    }

    fn push(self, delay: Duration, result: Result<String, CompletionError>) -> Self {
        self.script
            .lock()
            .expect("poisoned mock script")
            .push_back(MockReply { delay, result });
        self
    }

    /// Number of `complete` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("poisoned mock prompts").clone()
    }
}

/// Counts the trailing `Pain Points N:` block the default prompt ends with.
fn trailing_marker_count(prompt: &str) -> usize {
    prompt
        .lines()
        .rev()
        .take_while(|l| l.starts_with("Pain Points ") && l.ends_with(':'))
        .count()
}

fn echo_reply(prompt: &str) -> String {
    let n = trailing_marker_count(prompt);
    if n == 0 {
        return "Mock summary (no markers requested).".to_string();
    }
    (1..=n)
        .map(|i| format!("Pain Points {i}:\n- Mock pain point for feedback {i}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("poisoned mock prompts")
            .push(request.prompt.clone());

        let next = self.script.lock().expect("poisoned mock script").pop_front();
        match next {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result.map(|text| CompletionResponse { text })
            }
            None => Ok(CompletionResponse {
                text: echo_reply(&request.prompt),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::demux::{demultiplex_detailed, DemuxOutcome};
    use crate::feedback::prompt::build_prompt;
    use crate::feedback::types::FeedbackItem;

    fn req(prompt: String) -> CompletionRequest {
        CompletionRequest {
            prompt,
            max_tokens: 16,
            deployment: "d".into(),
        }
    }

    #[tokio::test]
    async fn echo_reply_round_trips_through_demux() {
        let batch: Vec<FeedbackItem> = (0..3)
            .map(|i| FeedbackItem::text("GitHub", &format!("c{i}"), "https://x"))
            .collect();
        let mock = MockCompletion::echo_markers();
        let out = mock.complete(&req(build_prompt(&batch, None))).await.unwrap();
        let (summaries, outcome) = demultiplex_detailed(&out.text, 3);
        assert_eq!(outcome, DemuxOutcome::Parsed);
        assert_eq!(summaries[2], "- Mock pain point for feedback 3");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let mock = MockCompletion::default()
            .then_status(429, "slow down")
            .then_ok("done");
        let first = mock.complete(&req("p".into())).await.unwrap_err();
        assert!(first.is_rate_limited());
        assert_eq!(mock.complete(&req("p".into())).await.unwrap().text, "done");
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.prompts(), vec!["p".to_string(), "p".to_string()]);
    }
}
