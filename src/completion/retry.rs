// src/completion/retry.rs
//! Per-batch retry state machine.
//!
//! Only rate limiting (status 429) is retried, with a fixed delay between
//! attempts. Every other failure ends the batch on the spot. The outcome is
//! mapped to the batch's summaries by `BatchOutcome::summaries`, which never
//! touches the network.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use super::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};
use crate::feedback::demux::demultiplex;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3_000;
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. 0 is treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
        }
    }
}

/// Terminal state of one batch's completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { text: String, attempts: u32 },
    RateLimited { attempts: u32 },
    Failed { message: String, attempts: u32 },
}

impl BatchOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            BatchOutcome::Completed { attempts, .. }
            | BatchOutcome::RateLimited { attempts }
            | BatchOutcome::Failed { attempts, .. } => *attempts,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            BatchOutcome::Completed { .. } => "completed",
            BatchOutcome::RateLimited { .. } => "rate_limited",
            BatchOutcome::Failed { .. } => "failed",
        }
    }

    /// Exactly `n` summaries for the batch.
    pub fn summaries(&self, n: usize) -> Vec<String> {
        match self {
            BatchOutcome::Completed { text, .. } => demultiplex(text, n),
            BatchOutcome::RateLimited { .. } => vec![RATE_LIMIT_MESSAGE.to_string(); n],
            BatchOutcome::Failed { message, .. } => vec![format!("Error: {message}"); n],
        }
    }
}

enum Step {
    Retry,
    Done(BatchOutcome),
}

fn next_step(
    result: Result<CompletionResponse, CompletionError>,
    attempt: u32,
    max_attempts: u32,
) -> Step {
    match result {
        Ok(resp) => Step::Done(BatchOutcome::Completed {
            text: resp.text,
            attempts: attempt,
        }),
        Err(e) if e.is_rate_limited() && attempt < max_attempts => Step::Retry,
        Err(e) if e.is_rate_limited() => Step::Done(BatchOutcome::RateLimited { attempts: attempt }),
        Err(e) => Step::Done(BatchOutcome::Failed {
            message: e.message(),
            attempts: attempt,
        }),
    }
}

/// Run one batch's completion under `policy`. Never returns an error; failures
/// are folded into the outcome.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> BatchOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        counter!("completion_attempts_total").increment(1);

        let result = match tokio::time::timeout(policy.attempt_timeout, client.complete(request)).await
        {
            Ok(r) => r,
            Err(_) => Err(CompletionError::Timeout(policy.attempt_timeout)),
        };

        if let Err(e) = &result {
            debug!(
                target: "completion",
                provider = client.name(),
                attempt,
                status = ?e.status(),
                error = %e,
                "completion attempt failed"
            );
        }

        match next_step(result, attempt, max_attempts) {
            Step::Retry => {
                warn!(
                    target: "completion",
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    "rate limit hit; retrying after delay"
                );
                counter!("completion_rate_limited_total").increment(1);
                tokio::time::sleep(policy.delay).await;
            }
            Step::Done(outcome) => {
                if let BatchOutcome::RateLimited { .. } = outcome {
                    counter!("completion_rate_limited_total").increment(1);
                }
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Result<CompletionResponse, CompletionError> {
        Err(CompletionError::Api {
            status,
            message: "m".into(),
        })
    }

    #[test]
    fn transitions() {
        assert!(matches!(next_step(api(429), 1, 2), Step::Retry));
        assert!(matches!(
            next_step(api(429), 2, 2),
            Step::Done(BatchOutcome::RateLimited { attempts: 2 })
        ));
        assert!(matches!(
            next_step(api(500), 1, 2),
            Step::Done(BatchOutcome::Failed { attempts: 1, .. })
        ));
        let ok = Ok(CompletionResponse { text: "t".into() });
        assert!(matches!(
            next_step(ok, 2, 2),
            Step::Done(BatchOutcome::Completed { attempts: 2, .. })
        ));
    }

    #[test]
    fn summaries_are_uniform_for_failures() {
        let rl = BatchOutcome::RateLimited { attempts: 2 };
        assert_eq!(rl.summaries(3), vec![RATE_LIMIT_MESSAGE.to_string(); 3]);

        let failed = BatchOutcome::Failed {
            message: "500 boom".into(),
            attempts: 1,
        };
        assert_eq!(failed.summaries(2), vec!["Error: 500 boom".to_string(); 2]);
    }

    #[test]
    fn completed_summaries_go_through_demux() {
        let done = BatchOutcome::Completed {
            text: "Pain Points 1: a\nPain Points 2: b".into(),
            attempts: 1,
        };
        assert_eq!(done.summaries(2), vec!["a", "b"]);
        assert_eq!(done.label(), "completed");
    }
}
