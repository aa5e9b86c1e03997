//! Retry controller
//!
//! Wraps a single completion call with classification-driven retry and
//! backoff. The routing, in priority order:
//!
//! 1. auth error with completed work this run - retried on the long
//!    schedule as disguised rate limiting, aborting when exhausted
//! 2. auth error with nothing completed - immediate abort, no retry
//! 3. rate limited - retried, aborting the run when exhausted
//! 4. any other failure - retried with exponential backoff, recorded as a
//!    permanent per-query failure when exhausted (the run continues)

use std::time::Duration;

use brandlens_core::{CompletionEndpoint, FailureKind, QueryRecord};
use tokio::time::sleep;
use tracing::warn;

use crate::error::CollectError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Attempt budget for one query
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Result of running one query through the retry controller
#[derive(Debug)]
pub enum RetryOutcome {
    /// The endpoint answered; payload is the raw response text.
    Completed(String),
    /// Retries exhausted on a per-query failure; payload is the error
    /// message to record. The run continues.
    GaveUp(String),
    /// A run-level stop condition; the caller flushes and propagates.
    Aborted(CollectError),
}

/// Run one query against the endpoint under the retry policy.
///
/// `prior_completions` is the number of rows already in the result set,
/// resumed rows included; it decides whether an auth error is trusted or
/// second-guessed as rate limiting.
pub async fn run_with_retry(
    endpoint: &dyn CompletionEndpoint,
    query: &QueryRecord,
    policy: &RetryPolicy,
    prior_completions: usize,
) -> RetryOutcome {
    let provider = endpoint.provider();
    let max_retries = policy.max_retries.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match endpoint.complete(&query.query_text).await {
            Ok(text) => return RetryOutcome::Completed(text),
            Err(err) => err,
        };

        let exhausted = attempt >= max_retries;

        match err.kind {
            FailureKind::Auth if prior_completions > 0 => {
                // An auth error that shows up only after queries have been
                // completing is, in practice, often rate limiting wearing an
                // auth message. Heuristic, not a diagnosis: retry on the
                // longer schedule instead of trusting it.
                if exhausted {
                    return RetryOutcome::Aborted(CollectError::AuthExhausted {
                        provider,
                        query_id: query.query_id.clone(),
                        attempts: attempt,
                        message: err.message,
                    });
                }
                let wait = auth_backoff(attempt);
                warn!(
                    query_id = %query.query_id,
                    "Auth error after {} completed queries - may be rate limiting, retrying in {:?} ({}/{})",
                    prior_completions, wait, attempt, max_retries
                );
                sleep(wait).await;
            }
            FailureKind::Auth => {
                return RetryOutcome::Aborted(CollectError::AuthFailure {
                    provider,
                    query_id: query.query_id.clone(),
                    message: err.message,
                });
            }
            FailureKind::RateLimited => {
                if exhausted {
                    return RetryOutcome::Aborted(CollectError::RateLimitExhausted {
                        provider,
                        query_id: query.query_id.clone(),
                        attempts: attempt,
                        message: err.message,
                    });
                }
                let wait = rate_limit_backoff(attempt);
                warn!(
                    query_id = %query.query_id,
                    "Rate limit hit, waiting {:?} before retry {}/{}",
                    wait, attempt, max_retries
                );
                sleep(wait).await;
            }
            FailureKind::Transient => {
                if exhausted {
                    return RetryOutcome::GaveUp(err.message);
                }
                let wait = transient_backoff(attempt);
                warn!(
                    query_id = %query.query_id,
                    "Attempt {}/{} failed ({}), retrying in {:?}",
                    attempt, max_retries, err.message, wait
                );
                sleep(wait).await;
            }
        }
    }
}

/// 10s, 20s, ... capped at 60s
fn rate_limit_backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(10 * attempt).min(60))
}

/// 15s, 30s, ... capped at 60s - the disguised-rate-limit schedule
fn auth_backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(15 * attempt).min(60))
}

/// 2s, 4s, 8s, ...
fn transient_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedEndpoint;
    use brandlens_core::CompletionError;
    use tokio::time::Instant;

    fn query() -> QueryRecord {
        QueryRecord {
            query_id: "Q1".to_string(),
            query_text: "best password manager".to_string(),
            topic: "pricing".to_string(),
        }
    }

    #[test]
    fn test_backoff_schedules() {
        assert_eq!(rate_limit_backoff(1), Duration::from_secs(10));
        assert_eq!(rate_limit_backoff(2), Duration::from_secs(20));
        assert_eq!(rate_limit_backoff(7), Duration::from_secs(60));

        assert_eq!(auth_backoff(1), Duration::from_secs(15));
        assert_eq!(auth_backoff(2), Duration::from_secs(30));
        assert_eq!(auth_backoff(5), Duration::from_secs(60));

        assert_eq!(transient_backoff(1), Duration::from_secs(2));
        assert_eq!(transient_backoff(2), Duration::from_secs(4));
        assert_eq!(transient_backoff(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_needs_no_backoff() {
        let endpoint = ScriptedEndpoint::new(vec![Ok("1Password is great".to_string())]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 0).await;

        assert!(matches!(outcome, RetryOutcome::Completed(text) if text == "1Password is great"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retries_then_succeeds() {
        let endpoint = ScriptedEndpoint::new(vec![
            Err(CompletionError::transient("connection reset")),
            Ok("answer".to_string()),
        ]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 0).await;

        assert!(matches!(outcome, RetryOutcome::Completed(_)));
        // One transient backoff: 2s
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion_gives_up() {
        let endpoint = ScriptedEndpoint::new(vec![
            Err(CompletionError::transient("boom")),
            Err(CompletionError::transient("boom")),
            Err(CompletionError::transient("boom")),
        ]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 0).await;

        assert!(matches!(outcome, RetryOutcome::GaveUp(msg) if msg == "boom"));
        // Backoffs after attempts 1 and 2: 2s + 4s
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_aborts() {
        let endpoint = ScriptedEndpoint::new(vec![
            Err(CompletionError::rate_limited("429")),
            Err(CompletionError::rate_limited("429")),
            Err(CompletionError::rate_limited("429")),
        ]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 0).await;

        assert!(matches!(
            outcome,
            RetryOutcome::Aborted(CollectError::RateLimitExhausted { attempts: 3, .. })
        ));
        // Backoffs after attempts 1 and 2: 10s + 20s
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_without_prior_work_aborts_immediately() {
        let endpoint = ScriptedEndpoint::new(vec![Err(CompletionError::auth("invalid key"))]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 0).await;

        assert!(matches!(
            outcome,
            RetryOutcome::Aborted(CollectError::AuthFailure { .. })
        ));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_with_prior_work_retries_on_long_schedule() {
        let endpoint = ScriptedEndpoint::new(vec![
            Err(CompletionError::auth("key expired")),
            Err(CompletionError::auth("key expired")),
            Err(CompletionError::auth("key expired")),
        ]);

        let start = Instant::now();
        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 5).await;

        assert!(matches!(
            outcome,
            RetryOutcome::Aborted(CollectError::AuthExhausted { attempts: 3, .. })
        ));
        // Backoffs after attempts 1 and 2: 15s + 30s
        assert_eq!(start.elapsed(), Duration::from_secs(45));
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_with_prior_work_recovers_mid_schedule() {
        let endpoint = ScriptedEndpoint::new(vec![
            Err(CompletionError::auth("key expired")),
            Ok("recovered".to_string()),
        ]);

        let outcome = run_with_retry(&endpoint, &query(), &RetryPolicy::default(), 1).await;

        assert!(matches!(outcome, RetryOutcome::Completed(text) if text == "recovered"));
    }
}
