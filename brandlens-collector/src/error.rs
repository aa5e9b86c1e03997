//! Errors that abort a collection run

use brandlens_core::{BrandLensError, Provider};
use thiserror::Error;

/// Run-aborting failures.
///
/// Per-query transient failures never appear here; they are recorded as
/// `ERROR:` rows and the run continues.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The pre-run liveness probe failed; nothing was attempted.
    #[error("{provider} liveness probe failed: {message}")]
    Precondition { provider: Provider, message: String },

    /// Authentication failed before anything completed this run; the
    /// credential itself is the likely culprit, so there is no retry.
    #[error("{provider} rejected the API key on query {query_id}: {message}")]
    AuthFailure {
        provider: Provider,
        query_id: String,
        message: String,
    },

    /// Authentication errors kept coming back after the disguised-rate-limit
    /// retry schedule was exhausted.
    #[error(
        "{provider} auth errors persisted through {attempts} attempts on query {query_id}: {message}"
    )]
    AuthExhausted {
        provider: Provider,
        query_id: String,
        attempts: u32,
        message: String,
    },

    /// Rate limiting survived every backoff; the run stops so it can be
    /// resumed later instead of burning quota.
    #[error("{provider} rate limited through {attempts} attempts on query {query_id}: {message}")]
    RateLimitExhausted {
        provider: Provider,
        query_id: String,
        attempts: u32,
        message: String,
    },

    /// Checkpoint or query-source I/O failure.
    #[error(transparent)]
    Store(#[from] BrandLensError),
}
